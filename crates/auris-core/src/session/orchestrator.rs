//! Request-scoped session orchestrator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::RecommendationConfig;
use crate::error::{Error, Result};
use crate::model::{Embedding, Engagement, Episode, ScoredEpisode, UserProfile};
use crate::pipeline::{run_pipeline, PipelineInput, QuerySuppliedCandidates};
use crate::providers::{embedding_namespace, EngagementStore, EpisodeProvider, UserStore, VectorQueryFilter, VectorStore};
use crate::telemetry::{events, telemetry_event};

use super::store::{Session, SessionId, SessionStore};

/// Per-call deadlines and backpressure knobs for the orchestrator.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub engagement_fetch_timeout: Duration,
    pub user_fetch_timeout: Duration,
    pub catalog_fetch_timeout: Duration,
    pub embedding_fetch_timeout: Duration,
    pub record_engagement_timeout: Duration,
    /// Max ids per `VectorStore::get_embeddings` call; large id sets are
    /// chunked transparently.
    pub embedding_fetch_chunk_size: usize,
    /// Whether a timed-out engagement/user fetch degrades to an empty
    /// result instead of failing the request.
    pub degrade_on_upstream_timeout: bool,
    /// Max retry attempts (beyond the first) for a provider call that fails
    /// or times out while `degrade_on_upstream_timeout` is off. `0` disables
    /// retries.
    pub max_upstream_retries: u32,
    /// Base delay for exponential backoff between retries: attempt `n`
    /// (1-indexed) sleeps `retry_backoff_base * 2^(n-1)` before retrying.
    pub retry_backoff_base: Duration,
    /// Max live sessions before LRU eviction kicks in.
    pub session_store_capacity: usize,
    pub default_limit: usize,
    pub strategy_version: String,
    pub dataset_version: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engagement_fetch_timeout: Duration::from_millis(2_000),
            user_fetch_timeout: Duration::from_millis(2_000),
            catalog_fetch_timeout: Duration::from_millis(5_000),
            embedding_fetch_timeout: Duration::from_millis(5_000),
            record_engagement_timeout: Duration::from_millis(2_000),
            embedding_fetch_chunk_size: 100,
            degrade_on_upstream_timeout: false,
            max_upstream_retries: 2,
            retry_backoff_base: Duration::from_millis(50),
            session_store_capacity: 10_000,
            default_limit: 10,
            strategy_version: "1".to_string(),
            dataset_version: "default".to_string(),
        }
    }
}

/// Request to create a new session.
#[derive(Debug, Clone, Default)]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
    pub engagements: Vec<Engagement>,
    pub excluded_ids: HashSet<String>,
    /// A precomputed user vector supplied by the client, which (if
    /// present) takes precedence over a server-computed one on the
    /// vector-query fast path.
    pub user_vector: Option<Embedding>,
    pub limit: Option<usize>,
}

/// The actual blend weights Stage B used, reported rather than hard-coded
/// on the response.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeightsDebug {
    pub weight_similarity: f64,
    pub weight_quality: f64,
    pub weight_recency: f64,
}

#[derive(Debug, Clone)]
pub struct SessionDebugInfo {
    pub scoring_weights: ScoringWeightsDebug,
    pub user_vector_episode_count: usize,
}

/// Response to `create_session` and, with only `episodes`/counts relevant,
/// to `next`.
#[derive(Debug, Clone)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub episodes: Vec<ScoredEpisode>,
    pub total_in_queue: usize,
    pub shown_count: usize,
    pub remaining_count: usize,
    pub cold_start: bool,
    pub algorithm_version: String,
    pub debug: SessionDebugInfo,
}

/// Request to record an engagement against a live session.
#[derive(Debug, Clone)]
pub struct EngageRequest {
    pub episode_id: String,
    pub kind: crate::model::EngagementKind,
    pub user_id: Option<String>,
}

/// The request-scoped coordinator tying the provider contracts, the
/// pipeline, and the session store together.
pub struct SessionOrchestrator<E, V, G, U>
where
    E: EpisodeProvider,
    V: VectorStore,
    G: EngagementStore,
    U: UserStore,
{
    episode_provider: Arc<E>,
    vector_store: Arc<V>,
    engagement_store: Arc<G>,
    user_store: Option<Arc<U>>,
    /// When set, used instead of calling `episode_provider.get_episodes`.
    in_memory_catalog: Option<Vec<Episode>>,
    session_store: Arc<SessionStore>,
    config: RecommendationConfig,
    session_config: SessionConfig,
}

impl<E, V, G, U> SessionOrchestrator<E, V, G, U>
where
    E: EpisodeProvider + 'static,
    V: VectorStore + 'static,
    G: EngagementStore + 'static,
    U: UserStore + 'static,
{
    pub fn new(
        episode_provider: Arc<E>,
        vector_store: Arc<V>,
        engagement_store: Arc<G>,
        user_store: Option<Arc<U>>,
        config: RecommendationConfig,
        session_config: SessionConfig,
    ) -> Self {
        let session_store = Arc::new(SessionStore::new(session_config.session_store_capacity));
        Self {
            episode_provider,
            vector_store,
            engagement_store,
            user_store,
            in_memory_catalog: None,
            session_store,
            config,
            session_config,
        }
    }

    /// Pin an in-memory catalog so step 1's catalog fetch is a clone
    /// instead of a provider round trip.
    pub fn with_in_memory_catalog(mut self, catalog: Vec<Episode>) -> Self {
        self.in_memory_catalog = Some(catalog);
        self
    }

    pub fn session_store(&self) -> &Arc<SessionStore> {
        &self.session_store
    }

    fn namespace(&self) -> String {
        embedding_namespace(
            crate::ALGORITHM_VERSION,
            &self.session_config.strategy_version,
            &self.session_config.dataset_version,
        )
    }

    /// Run `make_fut` under `timeout`, retrying a degradable failure up to
    /// `max_upstream_retries` times with `retry_backoff_base * 2^attempt`
    /// delay between attempts. A non-degradable error (anything other than
    /// [`Error::UpstreamUnavailable`]/[`Error::UpstreamTimeout`]) is
    /// returned immediately without retry.
    async fn call_with_retry<T, Fut>(&self, op_name: &str, timeout: Duration, mut make_fut: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::Future<Output = std::result::Result<T, crate::providers::ProviderError>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match tokio::time::timeout(timeout, make_fut()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => Error::from(e),
                Err(_) => Error::UpstreamTimeout(op_name.to_string()),
            };
            if attempt >= self.session_config.max_upstream_retries || !outcome.is_degradable() {
                return Err(outcome);
            }
            let delay = self.session_config.retry_backoff_base * 2u32.pow(attempt);
            telemetry_event!(
                warn,
                events::UPSTREAM_RETRY,
                operation = op_name,
                attempt = attempt + 1,
                error = %outcome
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch_engagements(&self, request: &CreateSessionRequest) -> Result<Vec<Engagement>> {
        if self.session_config.degrade_on_upstream_timeout {
            let fut = self.engagement_store.get_engagements_for_ranking(
                request.user_id.as_deref(),
                &request.engagements,
                None,
            );
            return match tokio::time::timeout(self.session_config.engagement_fetch_timeout, fut).await {
                Ok(Ok(engagements)) => Ok(engagements),
                Ok(Err(e)) => {
                    telemetry_event!(warn, "ENGAGEMENT_FETCH_DEGRADED", error = %e);
                    Ok(request.engagements.clone())
                }
                Err(_) => {
                    telemetry_event!(warn, "ENGAGEMENT_FETCH_TIMED_OUT_DEGRADED");
                    Ok(request.engagements.clone())
                }
            };
        }
        self.call_with_retry("engagement fetch", self.session_config.engagement_fetch_timeout, || {
            self.engagement_store
                .get_engagements_for_ranking(request.user_id.as_deref(), &request.engagements, None)
        })
        .await
    }

    async fn fetch_user(&self, request: &CreateSessionRequest) -> Result<Option<UserProfile>> {
        let Some(user_id) = request.user_id.as_deref() else {
            return Ok(None);
        };
        let Some(store) = self.user_store.as_ref() else {
            return Ok(None);
        };
        if self.session_config.degrade_on_upstream_timeout {
            let fut = store.get_by_id(user_id);
            return match tokio::time::timeout(self.session_config.user_fetch_timeout, fut).await {
                Ok(Ok(profile)) => Ok(profile),
                Ok(Err(e)) => {
                    telemetry_event!(warn, "USER_FETCH_DEGRADED", error = %e);
                    Ok(None)
                }
                Err(_) => {
                    telemetry_event!(warn, "USER_FETCH_TIMED_OUT_DEGRADED");
                    Ok(None)
                }
            };
        }
        self.call_with_retry("user fetch", self.session_config.user_fetch_timeout, || store.get_by_id(user_id))
            .await
    }

    async fn fetch_catalog(&self) -> Result<Vec<Episode>> {
        if let Some(catalog) = &self.in_memory_catalog {
            return Ok(catalog.clone());
        }
        self.call_with_retry("catalog fetch", self.session_config.catalog_fetch_timeout, || {
            self.episode_provider.get_episodes(None, None, None, None)
        })
        .await
    }

    async fn fetch_embeddings_chunked(&self, ids: &[String]) -> Result<HashMap<String, Embedding>> {
        let namespace = self.namespace();
        let chunk_size = self.session_config.embedding_fetch_chunk_size.max(1);
        let mut merged = HashMap::new();
        for chunk in ids.chunks(chunk_size) {
            let result = self
                .call_with_retry("embedding fetch", self.session_config.embedding_fetch_timeout, || {
                    self.vector_store.get_embeddings(chunk, &namespace)
                })
                .await?;
            merged.extend(result);
        }
        Ok(merged)
    }

    /// Create a new session: fetch catalog and user state, compute the
    /// ranked queue, and persist the resulting session.
    pub async fn create_session(&self, request: CreateSessionRequest) -> Result<SessionResponse> {
        let now = Utc::now();
        let limit = request.limit.unwrap_or(self.session_config.default_limit);

        // Step 1: concurrent fetch, three independent suspension points.
        let (engagements, user, catalog) = tokio::join!(
            self.fetch_engagements(&request),
            self.fetch_user(&request),
            self.fetch_catalog(),
        );
        let engagements = engagements?;
        let user = user?;
        let catalog = catalog?;

        // Step 2: episode_by_content_id, derived in memory only.
        let episodes_by_content_id: HashMap<String, Episode> = catalog
            .iter()
            .map(|ep| (ep.content_id.clone(), ep.clone()))
            .collect();
        let episodes_by_id: HashMap<&str, &Episode> = catalog.iter().map(|ep| (ep.id.as_str(), ep)).collect();
        let resolve_content_id = |content_id: &str| episodes_by_content_id.get(content_id);

        // Step 3: exclusions.
        let mut excluded = request.excluded_ids.clone();
        excluded.extend(engagements.iter().map(|e| e.episode_id.clone()));

        // Step 4: candidate ids, to bound the embedding fetch.
        let candidate_ids = crate::candidates::select_candidate_ids(&catalog, &excluded, &self.config, now);
        let mut needed_ids: Vec<String> = candidate_ids.clone();
        needed_ids.extend(engagements.iter().map(|e| e.episode_id.clone()));
        needed_ids.sort();
        needed_ids.dedup();

        // Step 5: embedding fetch (chunked).
        let embeddings = self.fetch_embeddings_chunked(&needed_ids).await?;

        // Step 6: optional vector-query fast path.
        let computed_user_vector = crate::user_vector::compute_user_vector(
            &engagements,
            &embeddings,
            &resolve_content_id,
            &episodes_by_id,
            user.as_ref(),
            &self.config,
        );
        let query_vector = request.user_vector.as_ref().or(computed_user_vector.user_vector.as_ref());

        let query_hits = match query_vector {
            Some(vector) => {
                let filter = VectorQueryFilter {
                    excluded_ids: excluded.clone(),
                    credibility_floor: self.config.credibility_floor,
                    combined_floor: self.config.combined_floor,
                    freshness_window_days: self.config.freshness_window_days,
                };
                self.vector_store
                    .query(vector, self.config.candidate_pool_size, &self.namespace(), &filter)
                    .await
                    .map_err(Error::from)?
            }
            None => {
                telemetry_event!(warn, events::SESSION_USER_VECTOR_NONE_FETCH_PATH);
                None
            }
        };
        if query_vector.is_some() && query_hits.is_none() {
            telemetry_event!(warn, events::SESSION_NO_QUERY_ASYNC);
        }

        // Step 7: pipeline. The query path resolves hits by primary id,
        // distinct from `episodes_by_content_id`'s content-id keying.
        let query_path_episodes_by_id: HashMap<String, Episode> =
            catalog.iter().map(|ep| (ep.id.clone(), ep.clone())).collect();
        let output = match &query_hits {
            Some(hits) => run_pipeline(PipelineInput {
                engagements,
                excluded_ids: excluded,
                episodes: None,
                supplied_candidates: Some(QuerySuppliedCandidates {
                    hits,
                    episodes_by_id: &query_path_episodes_by_id,
                }),
                embeddings: &embeddings,
                resolve_content_id: &resolve_content_id,
                episodes_by_id: &episodes_by_id,
                profile: user.as_ref(),
                config: &self.config,
                now,
                limit,
            }),
            None => run_pipeline(PipelineInput {
                engagements,
                excluded_ids: excluded,
                episodes: Some(&catalog),
                supplied_candidates: None,
                embeddings: &embeddings,
                resolve_content_id: &resolve_content_id,
                episodes_by_id: &episodes_by_id,
                profile: user.as_ref(),
                config: &self.config,
                now,
                limit,
            }),
        };

        // Step 8: persist.
        let queue_len = output.queue.len();
        let shown = output.queue.iter().take(limit).cloned().collect::<Vec<_>>();
        let shown_count = shown.len();
        let session = Session {
            session_id: String::new(),
            queue: output.queue,
            cursor: shown_count,
            cold_start: output.cold_start,
            created_at: now,
            algorithm_version: crate::ALGORITHM_VERSION.to_string(),
            dataset_version: self.session_config.dataset_version.clone(),
            engaged_ids: HashSet::new(),
            excluded_ids: request.excluded_ids,
            user_vector_episode_count: output.user_vector_episode_count,
        };
        let session_id = self.session_store.create(session);

        // Step 9: respond with the actual weights used.
        let scoring_weights = if output.used_warm_weights {
            ScoringWeightsDebug {
                weight_similarity: self.config.weight_similarity,
                weight_quality: self.config.weight_quality,
                weight_recency: self.config.weight_recency,
            }
        } else {
            ScoringWeightsDebug {
                weight_similarity: 0.0,
                weight_quality: self.config.cold_start.weight_quality,
                weight_recency: self.config.cold_start.weight_recency,
            }
        };

        Ok(SessionResponse {
            session_id,
            episodes: shown,
            total_in_queue: queue_len,
            shown_count,
            remaining_count: queue_len.saturating_sub(shown_count),
            cold_start: output.cold_start,
            algorithm_version: crate::ALGORITHM_VERSION.to_string(),
            debug: SessionDebugInfo {
                scoring_weights,
                user_vector_episode_count: output.user_vector_episode_count,
            },
        })
    }

    /// Advance an existing session's cursor and return the next page.
    pub fn next(&self, session_id: &str, count: usize) -> Result<Vec<ScoredEpisode>> {
        self.session_store.next(session_id, count)
    }

    /// Record an engagement: update in-memory session state synchronously,
    /// then persist asynchronously without blocking the response.
    pub async fn engage(&self, session_id: &str, request: EngageRequest) -> Result<()> {
        let in_queue = self.session_store.mark_engaged(session_id, &request.episode_id)?;
        if !in_queue {
            return Err(Error::InputInvalid(format!(
                "episode {} is not a member of session {session_id}'s queue",
                request.episode_id
            )));
        }

        let engagement_store = Arc::clone(&self.engagement_store);
        let timeout = self.session_config.record_engagement_timeout;
        let engagement = Engagement {
            episode_id: request.episode_id,
            kind: request.kind,
            timestamp: Utc::now(),
        };
        let user_id = request.user_id;

        tokio::spawn(async move {
            let fut = engagement_store.record_engagement(user_id.as_deref(), &engagement);
            match tokio::time::timeout(timeout, fut).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    telemetry_event!(warn, "ENGAGEMENT_PERSIST_FAILED", error = %e);
                }
                Err(_) => {
                    telemetry_event!(warn, "ENGAGEMENT_PERSIST_TIMED_OUT");
                }
            }
        });

        Ok(())
    }
}

#[cfg(all(test, feature = "memory-providers"))]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::model::CategoryTag;
    use crate::providers::{
        EpisodeProvider, InMemoryEngagementStore, InMemoryEpisodeProvider, InMemoryUserStore, InMemoryVectorStore,
        ProviderError,
    };

    /// Fails `get_episodes` with `ProviderError::Unavailable` for the first
    /// `fail_times` calls, then delegates to the wrapped provider.
    struct FlakyEpisodeProvider {
        inner: InMemoryEpisodeProvider,
        remaining_failures: AtomicU32,
    }

    impl FlakyEpisodeProvider {
        fn new(catalog: Vec<Episode>, fail_times: u32) -> Self {
            Self {
                inner: InMemoryEpisodeProvider::new(catalog),
                remaining_failures: AtomicU32::new(fail_times),
            }
        }
    }

    #[async_trait]
    impl EpisodeProvider for FlakyEpisodeProvider {
        async fn get_episodes(
            &self,
            since: Option<chrono::DateTime<Utc>>,
            until: Option<chrono::DateTime<Utc>>,
            limit: Option<usize>,
            offset: Option<usize>,
        ) -> std::result::Result<Vec<Episode>, ProviderError> {
            if self
                .remaining_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n - 1) } else { None })
                .is_ok()
            {
                return Err(ProviderError::Unavailable("simulated outage".to_string()));
            }
            self.inner.get_episodes(since, until, limit, offset).await
        }

        async fn get_episode(&self, id: &str) -> std::result::Result<Option<Episode>, ProviderError> {
            self.inner.get_episode(id).await
        }
    }

    fn episode(id: &str, credibility: i32, insight: i32) -> Episode {
        Episode {
            id: id.to_string(),
            content_id: format!("content-{id}"),
            title: "Title".to_string(),
            key_insight: "Insight".to_string(),
            series_id: "series-1".to_string(),
            series_name: "Series One".to_string(),
            categories: vec![CategoryTag {
                name: "tech".to_string(),
                weight: 1.0,
            }],
            credibility,
            insight,
            published_at: Utc::now(),
        }
    }

    fn build_orchestrator(
        catalog: Vec<Episode>,
    ) -> SessionOrchestrator<InMemoryEpisodeProvider, InMemoryVectorStore, InMemoryEngagementStore, InMemoryUserStore>
    {
        SessionOrchestrator::new(
            Arc::new(InMemoryEpisodeProvider::new(catalog.clone())),
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(InMemoryEngagementStore::new()),
            None,
            RecommendationConfig::default(),
            SessionConfig::default(),
        )
        .with_in_memory_catalog(catalog)
    }

    #[tokio::test]
    async fn create_session_cold_start_without_engagements() {
        let catalog = vec![episode("e1", 4, 4), episode("e2", 3, 3)];
        let orchestrator = build_orchestrator(catalog);

        let response = orchestrator
            .create_session(CreateSessionRequest {
                limit: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(response.cold_start);
        assert_eq!(response.debug.user_vector_episode_count, 0);
        assert!(response.shown_count <= 2);
    }

    #[tokio::test]
    async fn next_advances_cursor_monotonically() {
        let catalog: Vec<Episode> = (0..5).map(|i| episode(&format!("e{i}"), 4, 4)).collect();
        let orchestrator = build_orchestrator(catalog);

        let response = orchestrator
            .create_session(CreateSessionRequest {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        let page = orchestrator.next(&response.session_id, 2).unwrap();
        assert!(page.len() <= 2);
    }

    #[tokio::test]
    async fn next_on_unknown_session_fails() {
        let orchestrator = build_orchestrator(vec![episode("e1", 4, 4)]);
        let err = orchestrator.next("does-not-exist", 1).unwrap_err();
        assert_eq!(err.kind(), "session_not_found");
    }

    #[tokio::test]
    async fn engage_rejects_episode_outside_queue() {
        let catalog = vec![episode("e1", 4, 4)];
        let orchestrator = build_orchestrator(catalog);
        let response = orchestrator
            .create_session(CreateSessionRequest::default())
            .await
            .unwrap();

        let err = orchestrator
            .engage(
                &response.session_id,
                EngageRequest {
                    episode_id: "not-in-queue".to_string(),
                    kind: crate::model::EngagementKind::Click,
                    user_id: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "input_invalid");
    }

    #[tokio::test]
    async fn engage_marks_episode_engaged_and_excluded() {
        let catalog = vec![episode("e1", 4, 4)];
        let orchestrator = build_orchestrator(catalog);
        let response = orchestrator
            .create_session(CreateSessionRequest::default())
            .await
            .unwrap();
        let episode_id = response.episodes[0].episode.id.clone();

        orchestrator
            .engage(
                &response.session_id,
                EngageRequest {
                    episode_id: episode_id.clone(),
                    kind: crate::model::EngagementKind::Click,
                    user_id: None,
                },
            )
            .await
            .unwrap();

        let snapshot = orchestrator.session_store().get(&response.session_id).unwrap();
        assert!(snapshot.engaged_ids.contains(&episode_id));
        assert!(snapshot.excluded_ids.contains(&episode_id));
    }

    #[tokio::test]
    async fn create_session_uses_vector_query_fast_path_when_backend_supports_it() {
        use crate::model::Embedding;
        use crate::providers::VectorMetadata;

        let catalog = vec![episode("e1", 4, 4), episode("e2", 4, 4), episode("e3", 1, 1)];
        let vector_store = InMemoryVectorStore::new();
        let namespace = embedding_namespace(crate::ALGORITHM_VERSION, "1", "1");
        vector_store
            .save_embeddings(
                &namespace,
                &HashMap::from([
                    ("e1".to_string(), Embedding::new(vec![1.0, 0.0])),
                    ("e2".to_string(), Embedding::new(vec![0.9, 0.1])),
                    ("e3".to_string(), Embedding::new(vec![0.0, 1.0])),
                ]),
            )
            .await
            .unwrap();
        vector_store.seed_metadata(
            &namespace,
            HashMap::from([
                (
                    "e1".to_string(),
                    VectorMetadata {
                        credibility: Some(4),
                        insight: Some(4),
                        published_at: Some(Utc::now()),
                        ..Default::default()
                    },
                ),
                (
                    "e2".to_string(),
                    VectorMetadata {
                        credibility: Some(4),
                        insight: Some(4),
                        published_at: Some(Utc::now()),
                        ..Default::default()
                    },
                ),
                (
                    "e3".to_string(),
                    VectorMetadata {
                        credibility: Some(1),
                        insight: Some(1),
                        published_at: Some(Utc::now()),
                        ..Default::default()
                    },
                ),
            ]),
        );

        let orchestrator = SessionOrchestrator::new(
            Arc::new(InMemoryEpisodeProvider::new(catalog.clone())),
            Arc::new(vector_store),
            Arc::new(InMemoryEngagementStore::new()),
            None::<Arc<InMemoryUserStore>>,
            RecommendationConfig::default(),
            SessionConfig {
                strategy_version: "1".to_string(),
                dataset_version: "1".to_string(),
                ..SessionConfig::default()
            },
        )
        .with_in_memory_catalog(catalog);

        let response = orchestrator
            .create_session(CreateSessionRequest {
                user_vector: Some(Embedding::new(vec![1.0, 0.0])),
                limit: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();

        // e3 fails the credibility/combined floors, so the query path must
        // have filtered it out rather than falling back to the full catalog.
        assert!(response.episodes.iter().all(|s| s.episode.id != "e3"));
        assert!(response.episodes.iter().any(|s| s.episode.id == "e1"));
    }

    #[tokio::test]
    async fn create_session_retries_catalog_fetch_and_recovers() {
        let catalog = vec![episode("e1", 4, 4), episode("e2", 3, 3)];
        let orchestrator = SessionOrchestrator::new(
            Arc::new(FlakyEpisodeProvider::new(catalog, 2)),
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(InMemoryEngagementStore::new()),
            None::<Arc<InMemoryUserStore>>,
            RecommendationConfig::default(),
            SessionConfig {
                max_upstream_retries: 2,
                retry_backoff_base: Duration::from_millis(1),
                ..SessionConfig::default()
            },
        );

        let response = orchestrator
            .create_session(CreateSessionRequest {
                limit: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(response.shown_count <= 2);
    }

    #[tokio::test]
    async fn create_session_fails_after_exhausting_retries() {
        let catalog = vec![episode("e1", 4, 4)];
        let orchestrator = SessionOrchestrator::new(
            Arc::new(FlakyEpisodeProvider::new(catalog, 5)),
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(InMemoryEngagementStore::new()),
            None::<Arc<InMemoryUserStore>>,
            RecommendationConfig::default(),
            SessionConfig {
                max_upstream_retries: 2,
                retry_backoff_base: Duration::from_millis(1),
                ..SessionConfig::default()
            },
        );

        let err = orchestrator
            .create_session(CreateSessionRequest {
                limit: Some(10),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream_unavailable");
    }
}
