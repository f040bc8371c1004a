//! Badge assignment.
//!
//! A fixed priority order, at most two badges per episode. Single source
//! of truth: HTTP response builders call into this rather than
//! re-deriving the thresholds.

use crate::model::{Badge, Episode};

const HIGH_CREDIBILITY_THRESHOLD: i32 = 4;
const HIGH_INSIGHT_THRESHOLD: i32 = 4;
const DATA_RICH_CATEGORY_COUNT: usize = 3;
const MAX_BADGES: usize = 2;

/// Whether an episode reads as contrarian: high insight paired with a
/// middling credibility signal, the "provocative but not yet corroborated"
/// shape badge consumers want flagged.
fn is_contrarian(episode: &Episode) -> bool {
    episode.insight >= HIGH_INSIGHT_THRESHOLD && episode.credibility <= 2
}

/// Whether an episode carries enough category tags to read as data-dense.
fn is_data_rich(episode: &Episode) -> bool {
    episode.categories.len() >= DATA_RICH_CATEGORY_COUNT
}

/// Compute badges for a selected episode, in priority order, capped at
/// [`MAX_BADGES`].
pub fn compute_badges(episode: &Episode) -> Vec<Badge> {
    let mut badges = Vec::with_capacity(MAX_BADGES);

    if episode.credibility >= HIGH_CREDIBILITY_THRESHOLD {
        badges.push(Badge::HighCredibility);
    }
    if episode.insight >= HIGH_INSIGHT_THRESHOLD {
        badges.push(Badge::HighInsight);
    }
    if is_contrarian(episode) {
        badges.push(Badge::Contrarian);
    }
    if is_data_rich(episode) {
        badges.push(Badge::DataRich);
    }

    badges.truncate(MAX_BADGES);
    badges
}
