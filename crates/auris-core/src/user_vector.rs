//! User-vector computation.

use std::collections::HashMap;

use crate::config::RecommendationConfig;
use crate::model::{Embedding, Engagement, Episode, UserProfile};
use crate::telemetry::{events, telemetry_event};

/// Output of [`compute_user_vector`]: the optional vector itself, the
/// number of engagement-embedding pairs that fed into it, and whether the
/// session should be flagged cold-start.
#[derive(Debug, Clone)]
pub struct UserVectorResult {
    pub user_vector: Option<Embedding>,
    pub user_vector_episode_count: usize,
    pub cold_start: bool,
}

/// Resolve an engagement's episode, trying `episode_id` first then
/// `content_id`.
fn resolve_episode<'ep>(
    engagement: &Engagement,
    episodes_by_id: &HashMap<&str, &'ep Episode>,
    resolve_content_id: &dyn Fn(&str) -> Option<&'ep Episode>,
) -> Option<&'ep Episode> {
    episodes_by_id
        .get(engagement.episode_id.as_str())
        .copied()
        .or_else(|| resolve_content_id(&engagement.episode_id))
}

fn mean_vector(vectors: &[&Embedding]) -> Option<Embedding> {
    let dims = vectors.first()?.dimensions();
    let mut sum = vec![0.0_f64; dims];
    for v in vectors {
        if v.dimensions() != dims {
            continue;
        }
        for (acc, value) in sum.iter_mut().zip(v.as_ref()) {
            *acc += value;
        }
    }
    let n = vectors.len() as f64;
    for value in sum.iter_mut() {
        *value /= n;
    }
    Some(Embedding::new(sum))
}

fn weighted_mean_vector(pairs: &[(&Embedding, f64)]) -> Option<Embedding> {
    let dims = pairs.first()?.0.dimensions();
    let mut sum = vec![0.0_f64; dims];
    let mut total_weight = 0.0_f64;
    for (embedding, weight) in pairs {
        if embedding.dimensions() != dims {
            continue;
        }
        for (acc, value) in sum.iter_mut().zip(embedding.as_ref()) {
            *acc += value * weight;
        }
        total_weight += weight;
    }
    if total_weight <= 0.0 {
        return None;
    }
    for value in sum.iter_mut() {
        *value /= total_weight;
    }
    Some(Embedding::new(sum))
}

/// Compute the engagement-mean vector, used as a
/// standalone step by case 4 as well.
fn compute_engagement_mean<'ep>(
    engagements: &[Engagement],
    embeddings: &HashMap<String, Embedding>,
    episodes_by_id: &HashMap<&str, &'ep Episode>,
    resolve_content_id: &dyn Fn(&str) -> Option<&'ep Episode>,
    config: &RecommendationConfig,
) -> (Option<Embedding>, usize) {
    let mut sorted: Vec<&Engagement> = engagements.iter().collect();
    sorted.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
    sorted.truncate(config.user_vector_limit);

    let mut kept: Vec<(&Embedding, &Engagement)> = Vec::new();
    for engagement in sorted {
        let Some(episode) = resolve_episode(engagement, episodes_by_id, resolve_content_id) else {
            telemetry_event!(
                warn,
                events::ENGAGEMENT_EMBEDDING_SKIPPED,
                episode_id = %engagement.episode_id,
                reason = "episode_unresolvable"
            );
            continue;
        };
        let Some(embedding) = embeddings.get(&episode.id) else {
            telemetry_event!(
                warn,
                events::ENGAGEMENT_EMBEDDING_SKIPPED,
                episode_id = %engagement.episode_id,
                reason = "no_embedding"
            );
            continue;
        };
        kept.push((embedding, engagement));
    }

    let n = kept.len();
    if n == 0 {
        return (None, 0);
    }

    let vector = if config.use_weighted_engagements {
        let weighted: Vec<(&Embedding, f64)> = kept
            .iter()
            .filter_map(|(embedding, engagement)| {
                config
                    .engagement_weights
                    .weight_for(&engagement.kind)
                    .map(|w| (*embedding, w))
            })
            .collect();

        if !config.engagement_weights.is_usable() || weighted.len() != kept.len() {
            telemetry_event!(warn, events::USER_VECTOR_WEIGHTS_INVALID);
            mean_vector(&kept.iter().map(|(e, _)| *e).collect::<Vec<_>>())
        } else {
            weighted_mean_vector(&weighted)
                .or_else(|| mean_vector(&kept.iter().map(|(e, _)| *e).collect::<Vec<_>>()))
        }
    } else {
        mean_vector(&kept.iter().map(|(e, _)| *e).collect::<Vec<_>>())
    };

    (vector, n)
}

/// Compute the user vector, covering cold start, engagement-only,
/// anchor-only, and blended cases.
pub fn compute_user_vector<'ep>(
    engagements: &[Engagement],
    embeddings: &HashMap<String, Embedding>,
    resolve_content_id: &dyn Fn(&str) -> Option<&'ep Episode>,
    episodes_by_id: &HashMap<&str, &'ep Episode>,
    profile: Option<&UserProfile>,
    config: &RecommendationConfig,
) -> UserVectorResult {
    let anchor = profile.and_then(|p| p.category_anchor_vector.as_ref());

    if engagements.is_empty() {
        return match anchor {
            // Case 3: no engagements, category anchor present.
            Some(anchor) => UserVectorResult {
                user_vector: Some(anchor.clone()),
                user_vector_episode_count: 0,
                cold_start: true,
            },
            // Case 1: no engagements, no category anchor.
            None => UserVectorResult {
                user_vector: None,
                user_vector_episode_count: 0,
                cold_start: true,
            },
        };
    }

    let (engagement_mean, n) = compute_engagement_mean(
        engagements,
        embeddings,
        episodes_by_id,
        resolve_content_id,
        config,
    );

    let Some(engagement_mean) = engagement_mean else {
        // All engagements' embeddings were unresolvable: fall through to
        // case 1/3 behavior.
        return match anchor {
            Some(anchor) => UserVectorResult {
                user_vector: Some(anchor.clone()),
                user_vector_episode_count: 0,
                cold_start: true,
            },
            None => UserVectorResult {
                user_vector: None,
                user_vector_episode_count: 0,
                cold_start: true,
            },
        };
    };

    match anchor {
        // Case 2: engagements only.
        None => UserVectorResult {
            user_vector: Some(engagement_mean),
            user_vector_episode_count: n,
            cold_start: false,
        },
        // Case 4: engagements and category anchor.
        Some(anchor) => {
            if engagement_mean.dimensions() != anchor.dimensions() {
                telemetry_event!(
                    warn,
                    events::USER_VECTOR_DIM_MISMATCH,
                    engagement_dims = engagement_mean.dimensions(),
                    anchor_dims = anchor.dimensions()
                );
                return UserVectorResult {
                    user_vector: Some(engagement_mean),
                    user_vector_episode_count: n,
                    cold_start: false,
                };
            }
            let alpha = config.category_anchor_weight;
            let blended: Vec<f64> = engagement_mean
                .as_ref()
                .iter()
                .zip(anchor.as_ref())
                .map(|(e, a)| (1.0 - alpha) * e + alpha * a)
                .collect();
            UserVectorResult {
                user_vector: Some(Embedding::new(blended)),
                user_vector_episode_count: n,
                cold_start: false,
            }
        }
    }
}
