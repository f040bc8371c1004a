//! Top-level error taxonomy.
//!
//! A `#[non_exhaustive]` `thiserror` enum with one variant per error kind, a
//! `Result` type alias, and a stable machine-readable `kind()` string so the
//! HTTP boundary can map errors onto status codes without matching on
//! display text.

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy for the recommendation engine. Each variant carries a
/// human-readable message; none expose internal field names.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Malformed request: missing required fields, unparseable timestamps.
    /// Surfaced; never retried.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// Configuration violates validation (see [`crate::config::ConfigError`]).
    /// Surfaced at request entry; never recovered.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A provider could not be reached. Retried at most `N` times with
    /// exponential backoff when `degrade_on_upstream_timeout` is off;
    /// otherwise surfaced.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A provider exceeded its deadline. Same retry/degrade policy as
    /// [`Error::UpstreamUnavailable`].
    #[error("upstream timed out: {0}")]
    UpstreamTimeout(String),

    /// A vector had unexpected dimension. Logged and dropped at the call
    /// site; this variant is only returned where the caller explicitly
    /// asked for a hard failure (e.g. [`crate::scoring::cosine_similarity`]).
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected vector dimension.
        expected: usize,
        /// Actual vector dimension encountered.
        actual: usize,
    },

    /// Unknown session id. Surfaced as HTTP 404 at the boundary.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A data-model invariant failed after ranking. Should never happen;
    /// if detected, the request fails rather than returning a queue that
    /// violates its own contract.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolated(String),
}

impl Error {
    /// Stable machine-readable error-kind string, exposed at the HTTP
    /// boundary instead of internal variant/field names.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InputInvalid(_) => "input_invalid",
            Error::ConfigInvalid(_) => "config_invalid",
            Error::UpstreamUnavailable(_) => "upstream_unavailable",
            Error::UpstreamTimeout(_) => "upstream_timeout",
            Error::DimensionMismatch { .. } => "dimension_mismatch",
            Error::SessionNotFound(_) => "session_not_found",
            Error::InternalInvariantViolated(_) => "internal_invariant_violated",
        }
    }

    /// Whether a provider error of this kind may be degraded to an empty
    /// result rather than failing the request. Only engagement/user fetch
    /// errors may degrade; the embedding fetch on the fetch path never
    /// does.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Error::UpstreamUnavailable(_) | Error::UpstreamTimeout(_))
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(e: crate::config::ConfigError) -> Self {
        Error::ConfigInvalid(e.to_string())
    }
}

impl From<crate::providers::ProviderError> for Error {
    fn from(e: crate::providers::ProviderError) -> Self {
        match e {
            crate::providers::ProviderError::Unavailable(msg) => Error::UpstreamUnavailable(msg),
            crate::providers::ProviderError::Timeout(msg) => Error::UpstreamTimeout(msg),
            crate::providers::ProviderError::Other(msg) => Error::UpstreamUnavailable(msg),
        }
    }
}
