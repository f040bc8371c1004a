//! Stage B: blended scoring and series-diversity selection.

mod badges;

pub use badges::compute_badges;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::RecommendationConfig;
use crate::model::{Embedding, Episode, ScoredEpisode};
use crate::scoring::{cosine_similarity, days_since, quality_score, recency_score};
use crate::telemetry::{events, telemetry_event};

/// Per-candidate scratch scores computed before series-diversity selection.
struct CandidateScore<'ep> {
    episode: &'ep Episode,
    similarity: f64,
    quality: f64,
    recency: f64,
    final_score: f64,
}

/// How a candidate's similarity was determined, recorded only for
/// telemetry/debugging — never surfaced on [`ScoredEpisode`].
enum SimilaritySource {
    SuppliedByQuery,
    ComputedFromUserVector,
    DefaultFallback,
}

fn resolve_similarity(
    episode: &Episode,
    embeddings: &HashMap<String, Embedding>,
    user_vector: Option<&Embedding>,
    similarity_map: Option<&HashMap<String, f64>>,
    config: &RecommendationConfig,
) -> (f64, SimilaritySource) {
    if let Some(map) = similarity_map {
        if let Some(sim) = map.get(&episode.id).or_else(|| map.get(&episode.content_id)) {
            return (*sim, SimilaritySource::SuppliedByQuery);
        }
        if config.sim_fallback_logging_enabled {
            telemetry_event!(
                warn,
                events::SIMILARITY_MISSING_IN_QUERY_RESULTS,
                episode_id = %episode.id
            );
        }
        return (config.default_similarity_on_missing, SimilaritySource::DefaultFallback);
    }

    if let (Some(embedding), Some(user_vector)) = (embeddings.get(&episode.id), user_vector) {
        if embedding.dimensions() == user_vector.dimensions() {
            if let Ok(sim) = cosine_similarity(user_vector.as_ref(), embedding.as_ref()) {
                return (sim, SimilaritySource::ComputedFromUserVector);
            }
        }
    }

    if config.sim_fallback_logging_enabled {
        telemetry_event!(
            warn,
            events::SIMILARITY_FETCH_PATH_NO_PINECONE,
            episode_id = %episode.id
        );
    }
    (config.default_similarity_on_missing, SimilaritySource::DefaultFallback)
}

fn compute_scores<'ep>(
    candidates: &[&'ep Episode],
    embeddings: &HashMap<String, Embedding>,
    user_vector: Option<&Embedding>,
    similarity_map: Option<&HashMap<String, f64>>,
    config: &RecommendationConfig,
    now: DateTime<Utc>,
) -> Vec<CandidateScore<'ep>> {
    let use_warm_weights = user_vector.is_some() || similarity_map.is_some();
    let (w_s, w_q, w_r) = if use_warm_weights {
        (config.weight_similarity, config.weight_quality, config.weight_recency)
    } else {
        (0.0, config.cold_start.weight_quality, config.cold_start.weight_recency)
    };

    candidates
        .iter()
        .map(|&episode| {
            let (similarity, _source) =
                resolve_similarity(episode, embeddings, user_vector, similarity_map, config);
            let quality = quality_score(
                episode.credibility,
                episode.insight,
                config.credibility_multiplier,
                config.max_quality_score,
            );
            let recency = recency_score(days_since(episode.published_at, now), config.recency_lambda);
            let final_score = w_s * similarity + w_q * quality + w_r * recency;
            CandidateScore {
                episode,
                similarity,
                quality,
                recency,
                final_score,
            }
        })
        .collect()
}

/// Select up to `limit` candidates from `scores` using the series-diversity
/// in-processing algorithm.
fn select_diverse<'ep>(
    scores: &[CandidateScore<'ep>],
    config: &RecommendationConfig,
    limit: usize,
) -> Vec<(&'ep Episode, f64, f64, f64, f64, f64)> {
    let mut remaining: Vec<usize> = (0..scores.len()).collect();
    let mut series_counts: HashMap<&str, usize> = HashMap::new();
    let mut last_series: Option<&str> = None;
    let mut selected = Vec::with_capacity(limit.min(scores.len()));

    while selected.len() < limit && !remaining.is_empty() {
        let pick = pick_next(scores, &remaining, &series_counts, last_series, config)
            .or_else(|| {
                // Relax the not-equal-to-last-series constraint for this slot.
                let relaxed = pick_next(scores, &remaining, &series_counts, None, config);
                if relaxed.is_some() {
                    telemetry_event!(warn, events::SERIES_ADJACENCY_FORCED);
                }
                relaxed
            });

        let Some(idx) = pick else {
            break;
        };

        let score = &scores[idx];
        let count = series_counts.entry(score.episode.series_id.as_str()).or_insert(0);
        let effective_score = score.final_score * config.series_penalty_alpha.powi(*count as i32);
        *count += 1;
        last_series = Some(score.episode.series_id.as_str());

        selected.push((
            score.episode,
            score.similarity,
            score.quality,
            score.recency,
            score.final_score,
            effective_score,
        ));
        remaining.retain(|&r| r != idx);
    }

    selected
}

fn pick_next(
    scores: &[CandidateScore<'_>],
    remaining: &[usize],
    series_counts: &HashMap<&str, usize>,
    exclude_series: Option<&str>,
    config: &RecommendationConfig,
) -> Option<usize> {
    remaining
        .iter()
        .copied()
        .filter(|&idx| {
            let episode = scores[idx].episode;
            let count = series_counts.get(episode.series_id.as_str()).copied().unwrap_or(0);
            let under_cap = count < config.max_episodes_per_series;
            let not_last = exclude_series.is_none_or(|last| last != episode.series_id);
            under_cap && not_last
        })
        .max_by(|&a, &b| {
            let count_a = series_counts.get(scores[a].episode.series_id.as_str()).copied().unwrap_or(0);
            let count_b = series_counts.get(scores[b].episode.series_id.as_str()).copied().unwrap_or(0);
            let effective_a = scores[a].final_score * config.series_penalty_alpha.powi(count_a as i32);
            let effective_b = scores[b].final_score * config.series_penalty_alpha.powi(count_b as i32);
            effective_a
                .partial_cmp(&effective_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    scores[a]
                        .final_score
                        .partial_cmp(&scores[b].final_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| scores[a].episode.published_at.cmp(&scores[b].episode.published_at))
                .then_with(|| scores[b].episode.id.cmp(&scores[a].episode.id))
        })
}

/// Run Stage B end to end: score every candidate, then select a
/// series-diverse queue of at most `limit` episodes with badges attached.
pub fn rank(
    candidates: &[&Episode],
    embeddings: &HashMap<String, Embedding>,
    user_vector: Option<&Embedding>,
    similarity_map: Option<&HashMap<String, f64>>,
    config: &RecommendationConfig,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ScoredEpisode> {
    let scores = compute_scores(candidates, embeddings, user_vector, similarity_map, config, now);
    let selected = select_diverse(&scores, config, limit);

    selected
        .into_iter()
        .map(|(episode, similarity, quality, recency, final_score, effective_score)| ScoredEpisode {
            episode: episode.clone(),
            similarity,
            quality,
            recency,
            final_score,
            effective_score,
            badges: compute_badges(episode),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryTag;
    use chrono::Duration;

    fn episode(id: &str, series_id: &str, credibility: i32, insight: i32) -> Episode {
        Episode {
            id: id.to_string(),
            content_id: format!("content-{id}"),
            title: "Title".to_string(),
            key_insight: "Insight".to_string(),
            series_id: series_id.to_string(),
            series_name: format!("Series {series_id}"),
            categories: vec![CategoryTag {
                name: "tech".to_string(),
                weight: 1.0,
            }],
            credibility,
            insight,
            published_at: Utc::now() - Duration::days(1),
        }
    }

    #[test]
    fn supplied_similarity_map_takes_precedence() {
        let config = RecommendationConfig::default();
        let a = episode("A", "s1", 3, 3);
        let b = episode("B", "s2", 3, 3);
        let c = episode("C", "s3", 3, 3);
        let candidates = vec![&a, &b, &c];
        let embeddings = HashMap::new();

        let mut sim_map = HashMap::new();
        sim_map.insert("A".to_string(), 0.9);
        sim_map.insert("B".to_string(), 0.6);
        sim_map.insert("C".to_string(), 0.8);

        let queue = rank(&candidates, &embeddings, None, Some(&sim_map), &config, Utc::now(), 3);
        let ids: Vec<&str> = queue.iter().map(|s| s.episode.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C", "B"]);
    }

    #[test]
    fn missing_similarity_falls_back_to_default() {
        let config = RecommendationConfig::default();
        let a = episode("A", "s1", 3, 3);
        let candidates = vec![&a];
        let embeddings = HashMap::new();
        let sim_map: HashMap<String, f64> = HashMap::new();

        let queue = rank(&candidates, &embeddings, None, Some(&sim_map), &config, Utc::now(), 1);
        assert_eq!(queue[0].similarity, config.default_similarity_on_missing);
    }

    #[test]
    fn cold_start_weights_used_without_user_vector_or_similarity_map() {
        let config = RecommendationConfig::default();
        let a = episode("A", "s1", 4, 4);
        let candidates = vec![&a];
        let embeddings = HashMap::new();

        let queue = rank(&candidates, &embeddings, None, None, &config, Utc::now(), 1);
        let expected = config.cold_start.weight_quality * queue[0].quality
            + config.cold_start.weight_recency * queue[0].recency;
        assert!((queue[0].final_score - expected).abs() < 1e-9);
    }

    #[test]
    fn series_diversity_caps_per_series_and_avoids_adjacency() {
        let config = RecommendationConfig::default();
        let s1: Vec<Episode> = (0..5).map(|i| episode(&format!("s1-{i}"), "S1", 4, 4)).collect();
        let s2: Vec<Episode> = (0..2).map(|i| episode(&format!("s2-{i}"), "S2", 4, 3)).collect();
        let all: Vec<&Episode> = s1.iter().chain(s2.iter()).collect();
        let embeddings = HashMap::new();

        let queue = rank(&all, &embeddings, None, None, &config, Utc::now(), 5);
        assert_eq!(queue.len(), 4);

        let s1_count = queue.iter().filter(|s| s.episode.series_id == "S1").count();
        let s2_count = queue.iter().filter(|s| s.episode.series_id == "S2").count();
        assert_eq!(s1_count, 2);
        assert_eq!(s2_count, 2);

        for pair in queue.windows(2) {
            assert_ne!(pair[0].episode.series_id, pair[1].episode.series_id);
        }
    }

    #[test]
    fn queue_length_is_bounded_by_available_candidates() {
        let config = RecommendationConfig::default();
        let a = episode("A", "s1", 4, 4);
        let candidates = vec![&a];
        let embeddings = HashMap::new();
        let queue = rank(&candidates, &embeddings, None, None, &config, Utc::now(), 10);
        assert_eq!(queue.len(), 1);
    }
}
