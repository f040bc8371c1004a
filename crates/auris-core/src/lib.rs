//! # Auris Core
//!
//! Personalized "For You" recommendation engine for a podcast-episode
//! intelligence platform.
//!
//! Given a user's engagement history and a catalog of episodes with
//! precomputed quality signals and embeddings, this crate computes a
//! ranked queue of episodes per session, supports follow-up pagination and
//! engagement write-back, and maintains short-lived session state for
//! continued navigation.
//!
//! ## Architecture
//!
//! - [`scoring`] — pure scoring primitives (cosine similarity, quality,
//!   recency decay).
//! - [`config`] — typed, validated configuration with defaults and an
//!   override-map merge.
//! - [`candidates`] — Stage A candidate pool (quality + freshness +
//!   exclusion filtering).
//! - [`user_vector`] — mean/weighted-mean user-vector computation with
//!   category-anchor blending and cold-start handling.
//! - [`ranking`] — Stage B: blended scoring plus series-diversity selection
//!   and badges.
//! - [`pipeline`] — the pure orchestrator tying Stage A, user-vector
//!   computation, and Stage B together.
//! - [`providers`] — the abstract episode/vector/engagement/user store
//!   contracts the core depends on, plus (behind `memory-providers`) a
//!   reference in-memory/file-backed implementation.
//! - [`session`] — the request-scoped orchestrator (concurrent provider
//!   fetch, embedding fetch-by-id, pipeline invocation) and the in-memory
//!   session store backing pagination and engagement recording.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use auris_core::config::RecommendationConfig;
//! use auris_core::pipeline::{run_pipeline, PipelineInput};
//!
//! let config = RecommendationConfig::default();
//! let output = run_pipeline(PipelineInput {
//!     engagements: vec![],
//!     excluded_ids: Default::default(),
//!     episodes: Some(&catalog),
//!     supplied_candidates: None,
//!     embeddings: &embeddings,
//!     resolve_content_id: &|content_id| catalog_by_content_id.get(content_id).cloned(),
//!     profile: None,
//!     config: &config,
//!     now: chrono::Utc::now(),
//!     limit: 10,
//! });
//! ```

pub mod candidates;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod ranking;
pub mod scoring;
pub mod session;
pub mod telemetry;
pub mod user_vector;

pub use config::{ConfigError, RecommendationConfig, RecommendationConfigOverrides};
pub use error::{Error, Result};
pub use model::{
    CategoryTag, Embedding, Engagement, EngagementKind, Episode, ScoredEpisode, UserProfile,
};
pub use pipeline::{run_pipeline, PipelineInput, PipelineOutput};
pub use session::{Session, SessionId, SessionOrchestrator, SessionStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Algorithm version stamped on every session response's `algorithm_version`
/// field and folded into the embedding namespace.
pub const ALGORITHM_VERSION: &str = "foryou-v1";

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        config::RecommendationConfig,
        error::{Error, Result},
        model::{Embedding, Engagement, EngagementKind, Episode, ScoredEpisode, UserProfile},
        pipeline::{run_pipeline, PipelineInput, PipelineOutput},
        session::{Session, SessionId, SessionOrchestrator, SessionStore},
    };
}
