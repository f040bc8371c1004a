//! Engagement entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of interaction a user had with an episode.
///
/// `Listen` is defined by the schema but V1 treats only `Click` and
/// `Bookmark` as meaningful for the default blend weights; `Listen` is
/// still permitted and weighted per configuration. Any value outside the
/// recognized set deserializes to `Unrecognized` rather than failing: an
/// unrecognized kind is a normalization-time drop plus a telemetry event,
/// not a hard parse error, so the raw string survives until
/// [`crate::pipeline::run_pipeline`]'s normalization step can log it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngagementKind {
    Click,
    Bookmark,
    Listen,
    /// A kind outside the recognized set, carrying the original string for
    /// telemetry.
    Unrecognized(String),
}

impl EngagementKind {
    /// Canonical lowercase name, or the original string for `Unrecognized`.
    pub fn as_str(&self) -> &str {
        match self {
            EngagementKind::Click => "click",
            EngagementKind::Bookmark => "bookmark",
            EngagementKind::Listen => "listen",
            EngagementKind::Unrecognized(s) => s,
        }
    }

    /// Whether this kind is one of the three recognized kinds.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, EngagementKind::Unrecognized(_))
    }
}

impl From<&str> for EngagementKind {
    fn from(s: &str) -> Self {
        match s {
            "click" => EngagementKind::Click,
            "bookmark" => EngagementKind::Bookmark,
            "listen" => EngagementKind::Listen,
            other => EngagementKind::Unrecognized(other.to_string()),
        }
    }
}

impl Serialize for EngagementKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EngagementKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(EngagementKind::from(raw.as_str()))
    }
}

/// A recorded interaction of a user with an episode.
///
/// Appended by end-user actions, read per request to compute the user
/// vector, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    /// The episode the user interacted with. May reference an episode's
    /// `id` or, for legacy engagements, its `content_id`; resolution tries
    /// `id` first, then `content_id`.
    pub episode_id: String,
    /// The kind of interaction.
    pub kind: EngagementKind,
    /// When the interaction happened.
    pub timestamp: DateTime<Utc>,
}

impl Engagement {
    /// Total order used for sorting engagements: timestamp descending,
    /// ties broken by `episode_id` ascending.
    pub fn ordering_key(&self) -> (std::cmp::Reverse<DateTime<Utc>>, &str) {
        (std::cmp::Reverse(self.timestamp), self.episode_id.as_str())
    }
}
