//! ScoredEpisode entity and badges.

use serde::{Deserialize, Serialize};

use super::Episode;

/// A badge label attached to a scored episode. At most two per episode, by
/// a fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    HighCredibility,
    HighInsight,
    Contrarian,
    DataRich,
}

impl Badge {
    /// Canonical snake_case name, matching the HTTP response shape.
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::HighCredibility => "high_credibility",
            Badge::HighInsight => "high_insight",
            Badge::Contrarian => "contrarian",
            Badge::DataRich => "data_rich",
        }
    }
}

/// The output of Stage B for a single selected episode: its component
/// scores, the blended final score, the diversity-adjusted effective
/// score it was selected under, and any attached badges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEpisode {
    /// The underlying episode.
    pub episode: Episode,
    /// `sim(c)` used for this episode.
    pub similarity: f64,
    /// `quality_score(c)`.
    pub quality: f64,
    /// `recency_score(c)`.
    pub recency: f64,
    /// Blended `w_s * sim + w_q * quality + w_r * recency`.
    pub final_score: f64,
    /// `final_score` adjusted by the per-series diversity penalty at the
    /// moment this episode was selected.
    pub effective_score: f64,
    /// At most two badges, in priority order.
    pub badges: Vec<Badge>,
}
