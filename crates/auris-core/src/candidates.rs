//! Stage A: candidate pool selection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::config::RecommendationConfig;
use crate::model::Episode;
use crate::scoring::{days_since, quality_score};

/// Whether `episode` passes every Stage A gate: not excluded, above the
/// credibility/combined floors, and within the freshness window.
fn passes_gates(
    episode: &Episode,
    excluded_ids: &HashSet<String>,
    config: &RecommendationConfig,
    now: DateTime<Utc>,
) -> bool {
    !excluded_ids.contains(&episode.id)
        && episode.credibility >= config.credibility_floor
        && episode.combined_quality() >= config.combined_floor
        && days_since(episode.published_at, now) <= config.freshness_window_days
}

fn sort_key(episode: &Episode, config: &RecommendationConfig) -> f64 {
    quality_score(
        episode.credibility,
        episode.insight,
        config.credibility_multiplier,
        config.max_quality_score,
    )
}

/// Filter `episodes` down to the Stage A candidate pool: gated, sorted by
/// descending quality score (ties broken by more recent `published_at`,
/// then by `id` ascending), truncated to `config.candidate_pool_size`.
///
/// An empty result is valid; if fewer episodes pass the gates than the
/// configured pool size, every passing episode is returned.
pub fn select_candidates<'a>(
    episodes: &'a [Episode],
    excluded_ids: &HashSet<String>,
    config: &RecommendationConfig,
    now: DateTime<Utc>,
) -> Vec<&'a Episode> {
    let mut candidates: Vec<&Episode> = episodes
        .iter()
        .filter(|ep| passes_gates(ep, excluded_ids, config, now))
        .collect();

    candidates.sort_by(|a, b| {
        sort_key(b, config)
            .partial_cmp(&sort_key(a, config))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.published_at.cmp(&a.published_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    candidates.truncate(config.candidate_pool_size);
    candidates
}

/// Same as [`select_candidates`] but returns only the ids, used by the
/// session orchestrator to learn which embeddings
/// are worth fetching without holding onto borrowed episodes.
pub fn select_candidate_ids(
    episodes: &[Episode],
    excluded_ids: &HashSet<String>,
    config: &RecommendationConfig,
    now: DateTime<Utc>,
) -> Vec<String> {
    select_candidates(episodes, excluded_ids, config, now)
        .into_iter()
        .map(|ep| ep.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryTag;

    fn episode(id: &str, credibility: i32, insight: i32, days_old: i64) -> Episode {
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
            published_at: Utc::now() - chrono::Duration::days(days_old),
        }
    }

    #[test]
    fn excludes_low_credibility() {
        let config = RecommendationConfig::default();
        let episodes = vec![episode("e1", 1, 4, 1), episode("e2", 2, 3, 1)];
        let excluded = HashSet::new();
        let result = select_candidates(&episodes, &excluded, &config, Utc::now());
        let ids: Vec<&str> = result.iter().map(|e| e.id.as_str()).collect();
        assert!(!ids.contains(&"e1"));
        assert!(ids.contains(&"e2"));
    }

    #[test]
    fn excludes_stale_episodes() {
        let config = RecommendationConfig::default();
        let episodes = vec![episode("e1", 4, 4, 200)];
        let excluded = HashSet::new();
        let result = select_candidates(&episodes, &excluded, &config, Utc::now());
        assert!(result.is_empty());
    }

    #[test]
    fn excludes_ids_in_exclusion_set() {
        let config = RecommendationConfig::default();
        let episodes = vec![episode("e1", 4, 4, 1)];
        let mut excluded = HashSet::new();
        excluded.insert("e1".to_string());
        let result = select_candidates(&episodes, &excluded, &config, Utc::now());
        assert!(result.is_empty());
    }

    #[test]
    fn sorts_by_descending_quality_then_recency_then_id() {
        let config = RecommendationConfig::default();
        let episodes = vec![
            episode("b", 2, 3, 5),
            episode("a", 4, 4, 1),
            episode("c", 4, 4, 1),
        ];
        let excluded = HashSet::new();
        let result = select_candidates(&episodes, &excluded, &config, Utc::now());
        assert_eq!(result[0].id, "a");
        assert_eq!(result[1].id, "c");
        assert_eq!(result[2].id, "b");
    }

    #[test]
    fn truncates_to_pool_size() {
        let overrides = crate::config::RecommendationConfigOverrides {
            candidate_pool_size: Some(2),
            ..Default::default()
        };
        let config = RecommendationConfig::with_overrides(&overrides).unwrap();
        let episodes = vec![
            episode("a", 4, 4, 1),
            episode("b", 4, 4, 2),
            episode("c", 4, 4, 3),
        ];
        let excluded = HashSet::new();
        let result = select_candidates(&episodes, &excluded, &config, Utc::now());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn empty_result_when_nothing_passes() {
        let config = RecommendationConfig::default();
        let episodes = vec![episode("a", 0, 0, 1)];
        let excluded = HashSet::new();
        let result = select_candidates(&episodes, &excluded, &config, Utc::now());
        assert!(result.is_empty());
    }
}
