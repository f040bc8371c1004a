//! Liveness probe.

use std::sync::{Arc, LazyLock};
use std::time::SystemTime;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

static SERVER_START_TIME: LazyLock<SystemTime> = LazyLock::new(SystemTime::now);

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/healthz", get(healthz))
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime_seconds = SERVER_START_TIME.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    Json(json!({
        "status": "ok",
        "version": auris_core::VERSION,
        "algorithmVersion": auris_core::ALGORITHM_VERSION,
        "uptimeSeconds": uptime_seconds,
        "liveSessions": state.orchestrator.session_store().len(),
    }))
}
