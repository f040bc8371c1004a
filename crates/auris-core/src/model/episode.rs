//! Episode entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A category tag with a nonnegative relevance weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTag {
    /// Category name.
    pub name: String,
    /// Relevance weight, nonnegative.
    pub weight: f64,
}

/// An immutable record representing a podcast episode.
///
/// Produced by ingestion upstream, consumed read-only by the core, and
/// never mutated — the core only ever holds shared, cloned, or borrowed
/// references to episodes fetched through [`crate::providers::EpisodeProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// Opaque unique identifier.
    pub id: String,
    /// Secondary identifier used to resolve engagements that reference
    /// `content_id` rather than `id`.
    pub content_id: String,
    /// Display title.
    pub title: String,
    /// One-line key insight, shown in responses and used by badge rules.
    pub key_insight: String,
    /// Series identifier, used for the no-adjacent-same-series rule and
    /// the per-series cap.
    pub series_id: String,
    /// Display name of the series.
    pub series_name: String,
    /// Ordered category tags with relevance weights.
    pub categories: Vec<CategoryTag>,
    /// Credibility signal, `0..=4`.
    pub credibility: i32,
    /// Insight signal, `0..=4`.
    pub insight: i32,
    /// Publication instant, UTC.
    pub published_at: DateTime<Utc>,
}

impl Episode {
    /// `credibility + insight`, used by the combined-floor gate.
    pub fn combined_quality(&self) -> i32 {
        self.credibility + self.insight
    }
}
