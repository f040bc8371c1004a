//! Axum routes, one module per resource.

pub mod health;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod sessions;
