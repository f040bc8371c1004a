//! The pure pipeline orchestrator.
//!
//! Accepts no mutable state, performs no I/O, and is re-entrant and
//! deterministic given identical inputs — safe to call concurrently from
//! many request handlers without locking.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::candidates::select_candidates;
use crate::config::RecommendationConfig;
use crate::model::{Embedding, Engagement, Episode, ScoredEpisode};
use crate::providers::VectorQueryHit;
use crate::ranking::rank;
use crate::telemetry::{events, telemetry_event};
use crate::user_vector::compute_user_vector;

/// Candidates supplied by an external vector-store query, bypassing Stage
/// A entirely.
pub struct QuerySuppliedCandidates<'a> {
    pub hits: &'a [VectorQueryHit],
    pub episodes_by_id: &'a HashMap<String, Episode>,
}

/// Everything [`run_pipeline`] needs. Borrowing rather than owning keeps
/// this cheap to construct per request from data the orchestrator already
/// holds.
pub struct PipelineInput<'a> {
    pub engagements: Vec<Engagement>,
    pub excluded_ids: HashSet<String>,
    /// Full or prefiltered catalog to run Stage A over. `None` when
    /// `supplied_candidates` is used instead.
    pub episodes: Option<&'a [Episode]>,
    /// Candidates already selected and scored by an external vector query.
    /// When present, Stage A is skipped entirely.
    pub supplied_candidates: Option<QuerySuppliedCandidates<'a>>,
    pub embeddings: &'a HashMap<String, Embedding>,
    pub resolve_content_id: &'a dyn Fn(&str) -> Option<&'a Episode>,
    pub episodes_by_id: &'a HashMap<&'a str, &'a Episode>,
    pub profile: Option<&'a crate::model::UserProfile>,
    pub config: &'a RecommendationConfig,
    pub now: DateTime<Utc>,
    pub limit: usize,
}

/// The result of running the pipeline: the ranked queue, whether the
/// session is cold-start, and how many engagement-embedding pairs fed the
/// user vector.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub queue: Vec<ScoredEpisode>,
    pub cold_start: bool,
    pub user_vector_episode_count: usize,
    /// Whether Stage B used the normal `(w_s, w_q, w_r)` blend (a user
    /// vector existed or a similarity map was supplied) rather than the
    /// cold-start `(0, w_q_cold, w_r_cold)` blend. Lets callers report the
    /// *actual* weights used rather than guessing from `cold_start` alone.
    pub used_warm_weights: bool,
}

/// Drop engagements with an unrecognized `kind`, deduplicate by
/// `episode_id` (keeping the most recent timestamp), and sort by
/// timestamp descending.
fn normalize_engagements(engagements: Vec<Engagement>) -> Vec<Engagement> {
    let mut by_episode: HashMap<String, Engagement> = HashMap::new();
    for engagement in engagements {
        if !engagement.kind.is_recognized() {
            telemetry_event!(
                warn,
                events::ENGAGEMENT_KIND_UNRECOGNIZED,
                episode_id = %engagement.episode_id,
                kind = %engagement.kind.as_str()
            );
            continue;
        }
        by_episode
            .entry(engagement.episode_id.clone())
            .and_modify(|existing| {
                if engagement.timestamp > existing.timestamp {
                    *existing = engagement.clone();
                }
            })
            .or_insert(engagement);
    }
    let mut normalized: Vec<Engagement> = by_episode.into_values().collect();
    normalized.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
    normalized
}

/// Run the full pipeline: normalize engagements, obtain candidates (either
/// from an external query or via Stage A), compute the user vector, then
/// run Stage B.
pub fn run_pipeline(input: PipelineInput<'_>) -> PipelineOutput {
    let engagements = normalize_engagements(input.engagements);

    let (candidates, similarity_map): (Vec<&Episode>, Option<HashMap<String, f64>>) =
        match &input.supplied_candidates {
            Some(supplied) => {
                let candidates = supplied
                    .hits
                    .iter()
                    .filter_map(|hit| supplied.episodes_by_id.get(&hit.id))
                    .collect();
                let similarity_map = supplied
                    .hits
                    .iter()
                    .map(|hit| (hit.id.clone(), hit.similarity))
                    .collect();
                (candidates, Some(similarity_map))
            }
            None => {
                let episodes = input.episodes.unwrap_or(&[]);
                let candidates = select_candidates(episodes, &input.excluded_ids, input.config, input.now);
                (candidates, None)
            }
        };

    let user_vector_result = compute_user_vector(
        &engagements,
        input.embeddings,
        input.resolve_content_id,
        input.episodes_by_id,
        input.profile,
        input.config,
    );

    let used_warm_weights = user_vector_result.user_vector.is_some() || similarity_map.is_some();

    let queue = rank(
        &candidates,
        input.embeddings,
        user_vector_result.user_vector.as_ref(),
        similarity_map.as_ref(),
        input.config,
        input.now,
        input.limit,
    );

    PipelineOutput {
        queue,
        cold_start: user_vector_result.cold_start,
        user_vector_episode_count: user_vector_result.user_vector_episode_count,
        used_warm_weights,
    }
}
