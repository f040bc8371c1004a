//! Shared application state: the concrete orchestrator instantiation over
//! the in-memory reference providers, held behind an `Arc` and cloned into
//! each axum handler.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use auris_core::config::RecommendationConfig;
use auris_core::providers::{InMemoryEngagementStore, InMemoryEpisodeProvider, InMemoryUserStore, InMemoryVectorStore};
use auris_core::session::{SessionConfig, SessionOrchestrator};

use crate::config::ServerSettings;

/// The orchestrator monomorphized over the reference in-memory providers —
/// the only concrete instantiation `auris-server` needs.
pub type AppOrchestrator =
    SessionOrchestrator<InMemoryEpisodeProvider, InMemoryVectorStore, InMemoryEngagementStore, InMemoryUserStore>;

/// Everything an axum handler needs: the orchestrator and a read-only view
/// of the frozen config it started with (kept behind an `ArcSwap` per A2's
/// "config read fresh per request" note, even though this server has no
/// reload endpoint today — see DESIGN.md).
pub struct AppState {
    pub orchestrator: AppOrchestrator,
    pub recommendation_config: Arc<ArcSwap<RecommendationConfig>>,
}

impl AppState {
    /// Build the orchestrator from loaded settings, optionally preloading a
    /// JSON dataset/embeddings file as the in-memory catalog and vector
    /// store.
    pub fn from_settings(settings: &ServerSettings) -> anyhow::Result<Self> {
        let episode_provider = match &settings.dataset {
            Some(path) => InMemoryEpisodeProvider::load_from_file(path)?,
            None => InMemoryEpisodeProvider::new(Vec::new()),
        };
        let catalog = episode_provider.catalog_snapshot();

        let vector_store = match &settings.embeddings {
            Some(path) => load_vector_store(path, &settings.session_config)?,
            None => InMemoryVectorStore::new(),
        };

        let orchestrator = SessionOrchestrator::new(
            Arc::new(episode_provider),
            Arc::new(vector_store),
            Arc::new(InMemoryEngagementStore::new()),
            Some(Arc::new(InMemoryUserStore::new(std::collections::HashMap::new()))),
            settings.recommendation_config.clone(),
            settings.session_config.clone(),
        )
        .with_in_memory_catalog(catalog);

        Ok(Self {
            orchestrator,
            recommendation_config: Arc::new(ArcSwap::new(Arc::new(settings.recommendation_config.clone()))),
        })
    }
}

fn load_vector_store(path: &Path, session_config: &SessionConfig) -> anyhow::Result<InMemoryVectorStore> {
    let namespace = auris_core::providers::embedding_namespace(
        auris_core::ALGORITHM_VERSION,
        &session_config.strategy_version,
        &session_config.dataset_version,
    );
    Ok(InMemoryVectorStore::load_from_file(&namespace, path)?)
}
