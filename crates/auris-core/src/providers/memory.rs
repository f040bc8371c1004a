//! Reference in-memory/file-backed provider implementations.
//!
//! Not part of the core contract — a minimal, trustworthy backend for
//! tests, examples, and small deployments. A `Mutex`-guarded in-memory
//! structure behind `&self` methods, `Send + Sync` so it can be shared via
//! `Arc`, without pulling in a database: state here is small enough to live
//! in memory, optionally loaded from a JSON file at construction.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{Embedding, Engagement, Episode, UserProfile};

use super::{
    EngagementStore, EpisodeProvider, ProviderError, UserStore, VectorMetadata, VectorQueryFilter, VectorQueryHit,
    VectorStore,
};

fn io_err(context: &str, err: impl std::fmt::Display) -> ProviderError {
    ProviderError::Other(format!("{context}: {err}"))
}

/// Episode catalog loaded once from a JSON array of episodes and served
/// read-only thereafter. The `content_id` map is built at load time so
/// [`EpisodeProvider::get_episode_by_content_id_map`] never re-scans.
pub struct InMemoryEpisodeProvider {
    episodes: Vec<Episode>,
    by_id: HashMap<String, usize>,
    by_content_id: HashMap<String, Episode>,
}

impl InMemoryEpisodeProvider {
    pub fn new(episodes: Vec<Episode>) -> Self {
        let by_id = episodes
            .iter()
            .enumerate()
            .map(|(i, ep)| (ep.id.clone(), i))
            .collect();
        let by_content_id = episodes
            .iter()
            .map(|ep| (ep.content_id.clone(), ep.clone()))
            .collect();
        Self {
            episodes,
            by_id,
            by_content_id,
        }
    }

    /// Load a catalog from a JSON file containing an array of episodes.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| io_err("reading episode catalog", e))?;
        let episodes: Vec<Episode> =
            serde_json::from_slice(&bytes).map_err(|e| io_err("parsing episode catalog", e))?;
        Ok(Self::new(episodes))
    }

    /// A cheap clone of the resident catalog, for callers (e.g.
    /// `auris-server`) that want to pin it as a session orchestrator's
    /// in-memory catalog instead of round-tripping through `get_episodes`.
    pub fn catalog_snapshot(&self) -> Vec<Episode> {
        self.episodes.clone()
    }
}

#[async_trait]
impl EpisodeProvider for InMemoryEpisodeProvider {
    async fn get_episodes(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Episode>, ProviderError> {
        let filtered = self.episodes.iter().filter(|ep| {
            since.is_none_or(|s| ep.published_at >= s) && until.is_none_or(|u| ep.published_at <= u)
        });
        let offset = offset.unwrap_or(0);
        let page: Vec<Episode> = match limit {
            Some(limit) => filtered.skip(offset).take(limit).cloned().collect(),
            None => filtered.skip(offset).cloned().collect(),
        };
        Ok(page)
    }

    async fn get_episode(&self, id: &str) -> Result<Option<Episode>, ProviderError> {
        Ok(self.by_id.get(id).map(|&idx| self.episodes[idx].clone()))
    }

    async fn get_episode_by_content_id_map(&self) -> Result<HashMap<String, Episode>, ProviderError> {
        Ok(self.by_content_id.clone())
    }
}

/// Per-namespace embedding storage, optionally seeded from a JSON file
/// `{ id -> vector }`. `query` performs brute-force cosine ranking against
/// every embedding in the namespace, applying the filter's exclusion,
/// credibility, combined-quality, and freshness gates against whatever
/// metadata was attached via [`Self::seed_metadata`]; an id with no
/// attached metadata always passes the credibility/combined/freshness
/// gates since there is nothing to gate on.
pub struct InMemoryVectorStore {
    namespaces: Mutex<HashMap<String, HashMap<String, Embedding>>>,
    metadata: Mutex<HashMap<String, HashMap<String, VectorMetadata>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            namespaces: Mutex::new(HashMap::new()),
            metadata: Mutex::new(HashMap::new()),
        }
    }

    pub fn load_from_file(namespace: &str, path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| io_err("reading embeddings", e))?;
        let raw: HashMap<String, Vec<f64>> =
            serde_json::from_slice(&bytes).map_err(|e| io_err("parsing embeddings", e))?;
        let embeddings = raw.into_iter().map(|(id, v)| (id, Embedding::new(v))).collect();
        let mut namespaces = HashMap::new();
        namespaces.insert(namespace.to_string(), embeddings);
        Ok(Self {
            namespaces: Mutex::new(namespaces),
            metadata: Mutex::new(HashMap::new()),
        })
    }

    /// Attach gate-relevant metadata (credibility, insight, published-at)
    /// for ids already or later populated via [`VectorStore::save_embeddings`],
    /// so [`VectorStore::query`] can apply the same gates Stage A would.
    pub fn seed_metadata(&self, namespace: &str, metadata: HashMap<String, VectorMetadata>) {
        let mut guard = self.metadata.lock().expect("vector store mutex poisoned");
        guard.entry(namespace.to_string()).or_default().extend(metadata);
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn has_cache(&self, namespace: &str) -> Result<bool, ProviderError> {
        let guard = self.namespaces.lock().expect("vector store mutex poisoned");
        Ok(guard.get(namespace).is_some_and(|m| !m.is_empty()))
    }

    async fn get_embeddings(
        &self,
        ids: &[String],
        namespace: &str,
    ) -> Result<HashMap<String, Embedding>, ProviderError> {
        let guard = self.namespaces.lock().expect("vector store mutex poisoned");
        let Some(table) = guard.get(namespace) else {
            return Ok(HashMap::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| table.get(id).map(|v| (id.clone(), v.clone())))
            .collect())
    }

    async fn query(
        &self,
        vector: &Embedding,
        top_k: usize,
        namespace: &str,
        filter: &VectorQueryFilter,
    ) -> Result<Option<Vec<VectorQueryHit>>, ProviderError> {
        let embeddings_guard = self.namespaces.lock().expect("vector store mutex poisoned");
        let Some(table) = embeddings_guard.get(namespace) else {
            return Ok(Some(Vec::new()));
        };
        let metadata_guard = self.metadata.lock().expect("vector store mutex poisoned");
        let metadata_table = metadata_guard.get(namespace);

        let mut hits: Vec<VectorQueryHit> = table
            .iter()
            .filter(|(id, _)| !filter.excluded_ids.contains(*id))
            .filter(|(id, _)| {
                let Some(meta) = metadata_table.and_then(|m| m.get(*id)) else {
                    return true;
                };
                let credibility_ok = meta.credibility.is_none_or(|c| c >= filter.credibility_floor);
                let combined_ok = match (meta.credibility, meta.insight) {
                    (Some(c), Some(i)) => c + i >= filter.combined_floor,
                    _ => true,
                };
                let freshness_ok = meta
                    .published_at
                    .is_none_or(|p| crate::scoring::days_since(p, Utc::now()) <= filter.freshness_window_days);
                credibility_ok && combined_ok && freshness_ok
            })
            .map(|(id, embedding)| VectorQueryHit {
                id: id.clone(),
                similarity: crate::scoring::cosine_similarity_unchecked(&vector.vector, &embedding.vector),
                metadata: metadata_table.and_then(|m| m.get(id)).cloned(),
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(Some(hits))
    }

    async fn save_embeddings(
        &self,
        namespace: &str,
        embeddings: &HashMap<String, Embedding>,
    ) -> Result<(), ProviderError> {
        let mut guard = self.namespaces.lock().expect("vector store mutex poisoned");
        guard
            .entry(namespace.to_string())
            .or_default()
            .extend(embeddings.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

/// Engagement history keyed by user id, with request-supplied engagements
/// merged in per the EngagementStore contract.
pub struct InMemoryEngagementStore {
    by_user: Mutex<HashMap<String, Vec<Engagement>>>,
}

impl InMemoryEngagementStore {
    pub fn new() -> Self {
        Self {
            by_user: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed(initial: HashMap<String, Vec<Engagement>>) -> Self {
        Self {
            by_user: Mutex::new(initial),
        }
    }
}

impl Default for InMemoryEngagementStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngagementStore for InMemoryEngagementStore {
    async fn get_engagements_for_ranking(
        &self,
        user_id: Option<&str>,
        request_engagements: &[Engagement],
        limit: Option<usize>,
    ) -> Result<Vec<Engagement>, ProviderError> {
        let merged: Vec<Engagement> = match user_id {
            None => request_engagements.to_vec(),
            Some(user_id) => {
                let guard = self.by_user.lock().expect("engagement store mutex poisoned");
                let persisted = guard.get(user_id).cloned().unwrap_or_default();
                let mut by_episode: HashMap<String, Engagement> = HashMap::new();
                for engagement in persisted.into_iter().chain(request_engagements.iter().cloned()) {
                    by_episode
                        .entry(engagement.episode_id.clone())
                        .and_modify(|existing| {
                            if engagement.timestamp > existing.timestamp {
                                *existing = engagement.clone();
                            }
                        })
                        .or_insert(engagement);
                }
                by_episode.into_values().collect()
            }
        };
        let mut merged = merged;
        merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.episode_id.cmp(&b.episode_id)));
        if let Some(limit) = limit {
            merged.truncate(limit);
        }
        Ok(merged)
    }

    async fn record_engagement(
        &self,
        user_id: Option<&str>,
        engagement: &Engagement,
    ) -> Result<(), ProviderError> {
        let Some(user_id) = user_id else {
            return Ok(());
        };
        let mut guard = self.by_user.lock().expect("engagement store mutex poisoned");
        guard.entry(user_id.to_string()).or_default().push(engagement.clone());
        Ok(())
    }
}

/// User profiles keyed by user id, optionally seeded from a JSON file
/// `{ userId -> UserProfile }`.
pub struct InMemoryUserStore {
    profiles: HashMap<String, UserProfile>,
}

impl InMemoryUserStore {
    pub fn new(profiles: HashMap<String, UserProfile>) -> Self {
        Self { profiles }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| io_err("reading user profiles", e))?;
        let profiles: HashMap<String, UserProfile> =
            serde_json::from_slice(&bytes).map_err(|e| io_err("parsing user profiles", e))?;
        Ok(Self::new(profiles))
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_by_id(&self, user_id: &str) -> Result<Option<UserProfile>, ProviderError> {
        Ok(self.profiles.get(user_id).cloned())
    }
}
