//! Structured telemetry events.
//!
//! A fixed set of named telemetry events fire whenever the core takes a
//! documented fallback path (missing embedding, invalid engagement weights,
//! dimension mismatch, similarity fallback, ...). Using `tracing`'s
//! structured fields, rather than ad hoc `format!` strings in `warn!`
//! calls, lets tests install a subscriber and assert an event fired by
//! name, not just by matching on message text.

/// Emit a structured telemetry event with a stable `event` field.
///
/// All call sites use this instead of bare `tracing::warn!`/`debug!` so the
/// named events (`ENGAGEMENT_EMBEDDING_SKIPPED`,
/// `SIMILARITY_MISSING_IN_QUERY_RESULTS`, ...) are greppable and
/// test-assertable by name.
macro_rules! telemetry_event {
    ($level:ident, $event:expr, $($field:tt)*) => {
        tracing::$level!(event = $event, $($field)*);
    };
    ($level:ident, $event:expr) => {
        tracing::$level!(event = $event);
    };
}

pub(crate) use telemetry_event;

/// Names of every structured event the core may emit. Centralized so call
/// sites and tests share one source of truth instead of retyping string
/// literals.
pub mod events {
    pub const ENGAGEMENT_EMBEDDING_SKIPPED: &str = "ENGAGEMENT_EMBEDDING_SKIPPED";
    pub const USER_VECTOR_WEIGHTS_INVALID: &str = "USER_VECTOR_WEIGHTS_INVALID";
    pub const USER_VECTOR_DIM_MISMATCH: &str = "USER_VECTOR_DIM_MISMATCH";
    pub const SIMILARITY_MISSING_IN_QUERY_RESULTS: &str = "SIMILARITY_MISSING_IN_QUERY_RESULTS";
    pub const SIMILARITY_FETCH_PATH_NO_PINECONE: &str = "SIMILARITY_FETCH_PATH_NO_PINECONE";
    pub const SESSION_USER_VECTOR_NONE_FETCH_PATH: &str = "SESSION_USER_VECTOR_NONE_FETCH_PATH";
    pub const SESSION_NO_QUERY_ASYNC: &str = "SESSION_NO_QUERY_ASYNC";
    pub const SERIES_ADJACENCY_FORCED: &str = "series_adjacency_forced";
    pub const ENGAGEMENT_KIND_UNRECOGNIZED: &str = "ENGAGEMENT_KIND_UNRECOGNIZED";
    pub const UPSTREAM_RETRY: &str = "UPSTREAM_RETRY";
}
