//! `GET /metrics` Prometheus text exposition, behind the `metrics` feature
//! so a minimal deployment doesn't link the exporter (see Cargo.toml).

use std::sync::{Arc, OnceLock};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

fn handle() -> &'static PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install prometheus recorder")
    })
}

/// Installs the global recorder on first access so it is ready before any
/// handler records a metric. Called once from `main` at startup.
pub fn install() {
    handle();
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(render))
}

async fn render(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    metrics::gauge!("auris_live_sessions").set(state.orchestrator.session_store().len() as f64);
    handle().render()
}
