//! Black-box HTTP tests driving `auris-server`'s axum router end to end
//! with `tower::ServiceExt::oneshot`, exercising a full request/response
//! cycle instead of calling handlers directly.

use std::sync::Arc;

use auris_core::config::RecommendationConfig;
use auris_core::model::{CategoryTag, Episode};
use auris_core::providers::{InMemoryEngagementStore, InMemoryEpisodeProvider, InMemoryUserStore, InMemoryVectorStore};
use auris_core::session::{SessionConfig, SessionOrchestrator};
use auris_server::{build_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn episode(id: &str, series_id: &str, credibility: i32, insight: i32) -> Episode {
    Episode {
        id: id.to_string(),
        content_id: format!("content-{id}"),
        title: format!("Episode {id}"),
        key_insight: "An insight".to_string(),
        series_id: series_id.to_string(),
        series_name: format!("Series {series_id}"),
        categories: vec![CategoryTag {
            name: "tech".to_string(),
            weight: 1.0,
        }],
        credibility,
        insight,
        published_at: Utc::now(),
    }
}

fn test_state(catalog: Vec<Episode>) -> Arc<AppState> {
    let provider = InMemoryEpisodeProvider::new(catalog.clone());
    let orchestrator = SessionOrchestrator::new(
        Arc::new(provider),
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(InMemoryEngagementStore::new()),
        Some(Arc::new(InMemoryUserStore::new(Default::default()))),
        RecommendationConfig::default(),
        SessionConfig::default(),
    )
    .with_in_memory_catalog(catalog);

    Arc::new(AppState {
        orchestrator,
        recommendation_config: Arc::new(arc_swap::ArcSwap::new(Arc::new(RecommendationConfig::default()))),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_session_returns_a_queue() {
    let catalog: Vec<Episode> = (0..30).map(|i| episode(&format!("e{i}"), "s1", 4, 4)).collect();
    let router = build_router(test_state(catalog));

    let request = Request::builder()
        .method("POST")
        .uri("/sessions/create")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "limit": 10 }).to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["coldStart"], json!(true));
    assert!(body["episodes"].as_array().unwrap().len() <= 10);
}

#[tokio::test]
async fn next_then_engage_round_trip() {
    let catalog: Vec<Episode> = (0..20).map(|i| episode(&format!("e{i}"), "s1", 4, 4)).collect();
    let router = build_router(test_state(catalog));

    let create_request = Request::builder()
        .method("POST")
        .uri("/sessions/create")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "limit": 5 }).to_string()))
        .unwrap();
    let create_response = router.clone().oneshot(create_request).await.unwrap();
    let created = body_json(create_response).await;
    let session_id = created["sessionId"].as_str().unwrap().to_string();
    let first_episode_id = created["episodes"][0]["episode"]["id"].as_str().unwrap().to_string();

    let next_request = Request::builder()
        .method("POST")
        .uri(format!("/sessions/{session_id}/next"))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "count": 5 }).to_string()))
        .unwrap();
    let next_response = router.clone().oneshot(next_request).await.unwrap();
    assert_eq!(next_response.status(), StatusCode::OK);

    let engage_request = Request::builder()
        .method("POST")
        .uri(format!("/sessions/{session_id}/engage"))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "episodeId": first_episode_id, "kind": "click" }).to_string(),
        ))
        .unwrap();
    let engage_response = router.oneshot(engage_request).await.unwrap();
    assert_eq!(engage_response.status(), StatusCode::OK);
    let engaged = body_json(engage_response).await;
    assert_eq!(engaged["ok"], json!(true));
}

#[tokio::test]
async fn engage_outside_queue_is_bad_request() {
    let catalog = vec![episode("e1", "s1", 4, 4)];
    let router = build_router(test_state(catalog));

    let create_request = Request::builder()
        .method("POST")
        .uri("/sessions/create")
        .header("content-type", "application/json")
        .body(Body::empty())
        .unwrap();
    let create_response = router.clone().oneshot(create_request).await.unwrap();
    let created = body_json(create_response).await;
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    let engage_request = Request::builder()
        .method("POST")
        .uri(format!("/sessions/{session_id}/engage"))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "episodeId": "not-in-queue", "kind": "click" }).to_string(),
        ))
        .unwrap();
    let response = router.oneshot(engage_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_session_next_is_not_found() {
    let router = build_router(test_state(vec![episode("e1", "s1", 4, 4)]));

    let request = Request::builder()
        .method("POST")
        .uri("/sessions/does-not-exist/next")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "count": 1 }).to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn healthz_reports_ok() {
    let router = build_router(test_state(vec![episode("e1", "s1", 4, 4)]));

    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("ok"));
}
