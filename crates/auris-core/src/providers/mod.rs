//! Abstract provider contracts.
//!
//! The core never talks to a concrete backend directly — every external
//! fact (episode catalog, vectors, engagements, user profile) is fetched
//! through one of these traits: `async_trait` object-safe traits, one
//! `ProviderError` for every failure mode a concrete backend can produce.

#[cfg(feature = "memory-providers")]
mod memory;

#[cfg(feature = "memory-providers")]
pub use memory::{InMemoryEngagementStore, InMemoryEpisodeProvider, InMemoryUserStore, InMemoryVectorStore};

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{Embedding, Engagement, Episode, UserProfile};

/// Failure modes a concrete provider backend can report. Mapped onto
/// [`crate::Error`] at the call site (fetch path = fatal, degrade-eligible
/// paths may swallow it).
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider timed out: {0}")]
    Timeout(String),
    #[error("provider error: {0}")]
    Other(String),
}

/// A single ranked result from [`VectorStore::query`]: an episode id, its
/// similarity to the query vector, and whatever metadata the backend
/// chose to store alongside the vector.
#[derive(Debug, Clone)]
pub struct VectorQueryHit {
    pub id: String,
    pub similarity: f64,
    pub metadata: Option<VectorMetadata>,
}

/// Metadata a vector store may carry alongside each vector for filtering
/// and, on the query fast path without an in-memory catalog, to reconstruct
/// enough of an [`Episode`] to bypass the catalog fetch entirely.
#[derive(Debug, Clone, Default)]
pub struct VectorMetadata {
    pub credibility: Option<i32>,
    pub insight: Option<i32>,
    pub published_at: Option<DateTime<Utc>>,
    pub episode_id: Option<String>,
    pub title: Option<String>,
    pub key_insight: Option<String>,
    pub content_id: Option<String>,
    pub series_id: Option<String>,
    pub series_name: Option<String>,
}

/// Filter carried with a [`VectorStore::query`] call so the backend can
/// apply the same gates Stage A would have.
#[derive(Debug, Clone, Default)]
pub struct VectorQueryFilter {
    pub excluded_ids: std::collections::HashSet<String>,
    pub credibility_floor: i32,
    pub combined_floor: i32,
    pub freshness_window_days: i64,
}

/// Read-only access to the episode catalog.
///
/// Every operation is idempotent and side-effect-free; implementations may
/// be backed by an in-memory dataset, a mock HTTP service, or a remote
/// document store.
#[async_trait]
pub trait EpisodeProvider: Send + Sync {
    /// List episodes, optionally bounded by publish-time window and/or a
    /// page window.
    async fn get_episodes(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Episode>, ProviderError>;

    /// Fetch a single episode by its primary id.
    async fn get_episode(&self, id: &str) -> Result<Option<Episode>, ProviderError>;

    /// A `content_id -> Episode` map, derivable from [`Self::get_episodes`].
    /// Implementations backed by an in-memory catalog should override this
    /// to build the map once rather than forcing callers to scan twice.
    async fn get_episode_by_content_id_map(
        &self,
    ) -> Result<HashMap<String, Episode>, ProviderError> {
        let episodes = self.get_episodes(None, None, None, None).await?;
        Ok(episodes
            .into_iter()
            .map(|ep| (ep.content_id.clone(), ep))
            .collect())
    }
}

/// Access to precomputed embeddings and, optionally, an ANN index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether embeddings for `namespace` have been populated at all.
    async fn has_cache(&self, namespace: &str) -> Result<bool, ProviderError>;

    /// Fetch embeddings for `ids` within `namespace`. Must return only the
    /// subset of `ids` that exist; missing ids are silently omitted, never
    /// an error.
    async fn get_embeddings(
        &self,
        ids: &[String],
        namespace: &str,
    ) -> Result<HashMap<String, Embedding>, ProviderError>;

    /// Optional ANN search. `None` means "unsupported"; callers fall back
    /// to the fetch-by-id path.
    async fn query(
        &self,
        _vector: &Embedding,
        _top_k: usize,
        _namespace: &str,
        _filter: &VectorQueryFilter,
    ) -> Result<Option<Vec<VectorQueryHit>>, ProviderError> {
        Ok(None)
    }

    /// Optional write-back of freshly computed embeddings. A no-op default
    /// is valid for read-only backends.
    async fn save_embeddings(
        &self,
        _namespace: &str,
        _embeddings: &HashMap<String, Embedding>,
    ) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Access to engagement history.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Engagements to use for ranking, ordered by timestamp descending.
    ///
    /// When `user_id` is present, the store merges its own persisted
    /// engagements with `request_engagements`, deduped on `episode_id`
    /// preferring the newer timestamp. When `user_id` is absent, returns
    /// `request_engagements` unchanged.
    async fn get_engagements_for_ranking(
        &self,
        user_id: Option<&str>,
        request_engagements: &[Engagement],
        limit: Option<usize>,
    ) -> Result<Vec<Engagement>, ProviderError>;

    /// Persist a new engagement. A no-op when `user_id` is `None`.
    async fn record_engagement(
        &self,
        user_id: Option<&str>,
        engagement: &Engagement,
    ) -> Result<(), ProviderError>;
}

/// Access to user profiles.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, user_id: &str) -> Result<Option<UserProfile>, ProviderError>;
}

/// Deterministic embedding namespace: `"{algorithm_version}_s{strategy_version}__{dataset_version}"`.
pub fn embedding_namespace(algorithm_version: &str, strategy_version: &str, dataset_version: &str) -> String {
    format!("{algorithm_version}_s{strategy_version}__{dataset_version}")
}
