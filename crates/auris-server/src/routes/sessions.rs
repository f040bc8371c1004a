//! `/sessions/*` routes.
//!
//! Thin serde DTOs over [`auris_core::session::SessionOrchestrator`]; the
//! handlers do no ranking of their own, they just translate between wire
//! shapes and the orchestrator's request/response types.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use auris_core::model::{Embedding, Engagement, EngagementKind, ScoredEpisode};
use auris_core::session::{CreateSessionRequest, EngageRequest};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/create", post(create))
        .route("/sessions/{id}/next", post(next))
        .route("/sessions/{id}/engage", post(engage))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngagementDto {
    episode_id: String,
    kind: String,
    timestamp: DateTime<Utc>,
}

impl From<EngagementDto> for Engagement {
    fn from(dto: EngagementDto) -> Self {
        Engagement {
            episode_id: dto.episode_id,
            kind: EngagementKind::from(dto.kind.as_str()),
            timestamp: dto.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionDto {
    user_id: Option<String>,
    #[serde(default)]
    engagements: Vec<EngagementDto>,
    #[serde(default)]
    excluded_ids: HashSet<String>,
    user_vector: Option<Embedding>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoringWeightsDto {
    weight_similarity: f64,
    weight_quality: f64,
    weight_recency: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionDebugDto {
    scoring_weights: ScoringWeightsDto,
    user_vector_episode_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponseDto {
    session_id: String,
    episodes: Vec<ScoredEpisode>,
    total_in_queue: usize,
    shown_count: usize,
    remaining_count: usize,
    cold_start: bool,
    algorithm_version: String,
    debug: SessionDebugDto,
}

impl From<auris_core::session::SessionResponse> for SessionResponseDto {
    fn from(r: auris_core::session::SessionResponse) -> Self {
        Self {
            session_id: r.session_id,
            episodes: r.episodes,
            total_in_queue: r.total_in_queue,
            shown_count: r.shown_count,
            remaining_count: r.remaining_count,
            cold_start: r.cold_start,
            algorithm_version: r.algorithm_version,
            debug: SessionDebugDto {
                scoring_weights: ScoringWeightsDto {
                    weight_similarity: r.debug.scoring_weights.weight_similarity,
                    weight_quality: r.debug.scoring_weights.weight_quality,
                    weight_recency: r.debug.scoring_weights.weight_recency,
                },
                user_vector_episode_count: r.debug.user_vector_episode_count,
            },
        }
    }
}

/// `POST /sessions/create`.
async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionDto>,
) -> Result<Json<SessionResponseDto>, ApiError> {
    let request = CreateSessionRequest {
        user_id: body.user_id,
        engagements: body.engagements.into_iter().map(Engagement::from).collect(),
        excluded_ids: body.excluded_ids,
        user_vector: body.user_vector,
        limit: body.limit,
    };
    let response = state.orchestrator.create_session(request).await?;
    Ok(Json(response.into()))
}

#[derive(Debug, Deserialize)]
struct NextDto {
    count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NextResponseDto {
    episodes: Vec<ScoredEpisode>,
}

/// `POST /sessions/{id}/next`.
async fn next(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<NextDto>,
) -> Result<Json<NextResponseDto>, ApiError> {
    let episodes = state.orchestrator.next(&id, body.count)?;
    Ok(Json(NextResponseDto { episodes }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngageDto {
    episode_id: String,
    kind: String,
    user_id: Option<String>,
    // Display-only fields accepted but not used by the core; some
    // clients pass them along so their own logs stay self-contained.
    #[allow(dead_code)]
    episode_title: Option<String>,
    #[allow(dead_code)]
    series_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct EngageResponseDto {
    ok: bool,
}

/// `POST /sessions/{id}/engage`.
async fn engage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<EngageDto>,
) -> Result<Json<EngageResponseDto>, ApiError> {
    let request = EngageRequest {
        episode_id: body.episode_id,
        kind: EngagementKind::from(body.kind.as_str()),
        user_id: body.user_id,
    };
    state.orchestrator.engage(&id, request).await?;
    Ok(Json(EngageResponseDto { ok: true }))
}
