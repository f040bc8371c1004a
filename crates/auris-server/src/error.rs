//! Maps [`auris_core::Error`] onto HTTP status codes and the
//! `{ "error": { "kind", "message" } }` body shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Thin wrapper so axum handlers can return `Result<T, ApiError>` and get
/// the right status code and body for free.
pub struct ApiError(pub auris_core::Error);

impl From<auris_core::Error> for ApiError {
    fn from(e: auris_core::Error) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            auris_core::Error::InputInvalid(_) => StatusCode::BAD_REQUEST,
            auris_core::Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
            auris_core::Error::ConfigInvalid(_) | auris_core::Error::DimensionMismatch { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            auris_core::Error::UpstreamUnavailable(_) | auris_core::Error::UpstreamTimeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            auris_core::Error::InternalInvariantViolated(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // `Error` is `#[non_exhaustive]`; a future variant defaults to
            // 500 rather than failing to compile.
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.0.kind(),
                message: self.0.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
