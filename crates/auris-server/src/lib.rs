//! HTTP boundary for the recommendation engine: wires the pure
//! `auris-core` engine to a concrete set of providers and exposes it over
//! axum.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ServerArgs, ServerSettings};
pub use state::{AppOrchestrator, AppState};

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the axum router for a given [`AppState`], without binding a
/// listener — used by both `main.rs` and the black-box `tests/e2e` harness
/// via `tower::ServiceExt::oneshot`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .merge(routes::sessions::router())
        .merge(routes::health::router());

    #[cfg(feature = "metrics")]
    let router = router.merge(routes::metrics::router());

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
