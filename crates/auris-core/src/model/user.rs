//! UserProfile entity.

use serde::{Deserialize, Serialize};

use super::Embedding;

/// Optional per-user record carrying a category-anchor vector and
/// optionally a list of category interest names. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User id this profile belongs to.
    pub user_id: String,
    /// Fixed-dimensional vector representing the user's stated category
    /// interests, blended with the engagement-mean vector in
    /// [`crate::user_vector::compute_user_vector`] case 4.
    pub category_anchor_vector: Option<Embedding>,
    /// Human-readable category interest names, display-only.
    pub category_interests: Vec<String>,
}
