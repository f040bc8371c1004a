//! `auris-server` binary entry point: parse CLI args, load config, build
//! the axum router over the in-memory reference providers, and serve.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use auris_server::{build_router, AppState, ServerArgs};

fn init_tracing(log_level: Option<&str>, log_format: &str) {
    let filter = log_level
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();

    let settings = match auris_server::config::load(args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load server settings: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(settings.log_level.as_deref(), &settings.log_format);

    #[cfg(feature = "metrics")]
    auris_server::routes::metrics::install();

    let state = match AppState::from_settings(&settings) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("failed to build server state: {e}");
            std::process::exit(1);
        }
    };

    info!(
        bind = %settings.bind,
        algorithm_version = auris_core::ALGORITHM_VERSION,
        "auris-server starting"
    );

    let router = build_router(state);
    let listener = match tokio::net::TcpListener::bind(&settings.bind).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind {}: {e}", settings.bind);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}
