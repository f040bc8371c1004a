//! Typed, validated configuration.
//!
//! A single canonical source of defaults: [`RecommendationConfig::default`]
//! plus an explicit [`RecommendationConfigOverrides`] merged on top via
//! [`RecommendationConfig::with_overrides`]. The resulting config is
//! immutable for the duration of a request.

use serde::{Deserialize, Serialize};

/// Per-kind engagement weights used by the weighted-mean user-vector
/// computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementWeights {
    pub click: f64,
    pub bookmark: f64,
    pub listen: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            click: 1.0,
            bookmark: 10.0,
            listen: 1.5,
        }
    }
}

impl EngagementWeights {
    /// Look up the weight for a recognized engagement kind. Callers must
    /// filter out [`crate::model::EngagementKind::Unrecognized`] before
    /// calling this — unrecognized kinds are dropped during normalization,
    /// not weighted.
    pub fn weight_for(&self, kind: &crate::model::EngagementKind) -> Option<f64> {
        use crate::model::EngagementKind;
        match kind {
            EngagementKind::Click => Some(self.click),
            EngagementKind::Bookmark => Some(self.bookmark),
            EngagementKind::Listen => Some(self.listen),
            EngagementKind::Unrecognized(_) => None,
        }
    }

    /// Whether all weights are finite, nonnegative, and sum to a positive
    /// value.
    pub fn is_usable(&self) -> bool {
        let weights = [self.click, self.bookmark, self.listen];
        weights.iter().all(|w| w.is_finite() && *w >= 0.0) && weights.iter().sum::<f64>() > 0.0
    }
}

/// Blend weights used when no user vector exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColdStartWeights {
    pub weight_quality: f64,
    pub weight_recency: f64,
}

impl Default for ColdStartWeights {
    fn default() -> Self {
        Self {
            weight_quality: 0.60,
            weight_recency: 0.40,
        }
    }
}

/// Frozen, validated configuration consumed by every pipeline stage.
///
/// Built from [`RecommendationConfig::default`] merged with an explicit
/// [`RecommendationConfigOverrides`], then validated once via
/// [`RecommendationConfig::validate`]. Cheap to `Clone` (no heap
/// allocation beyond the two small nested structs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationConfig {
    pub credibility_floor: i32,
    pub combined_floor: i32,
    pub freshness_window_days: i64,
    pub candidate_pool_size: usize,
    pub user_vector_limit: usize,
    pub engagement_weights: EngagementWeights,
    pub use_weighted_engagements: bool,
    pub weight_similarity: f64,
    pub weight_quality: f64,
    pub weight_recency: f64,
    pub recency_lambda: f64,
    pub credibility_multiplier: f64,
    pub max_quality_score: f64,
    pub series_penalty_alpha: f64,
    pub max_episodes_per_series: usize,
    pub category_anchor_weight: f64,
    pub cold_start: ColdStartWeights,
    pub default_similarity_on_missing: f64,
    pub sim_fallback_logging_enabled: bool,
    /// Expected dimension of every embedding vector. Not an
    /// override-surfaced tuning knob, just the configured embedding
    /// dimension used to detect mismatches.
    pub embedding_dimensions: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            credibility_floor: 2,
            combined_floor: 5,
            freshness_window_days: 90,
            candidate_pool_size: 150,
            user_vector_limit: 10,
            engagement_weights: EngagementWeights::default(),
            use_weighted_engagements: true,
            weight_similarity: 0.85,
            weight_quality: 0.10,
            weight_recency: 0.05,
            recency_lambda: 0.03,
            credibility_multiplier: 1.5,
            // Caps the pre-normalization numerator at the natural maximum
            // for the default credibility_multiplier (1.5*4 + 4 = 10), so
            // the cap is a no-op until an operator tightens it. See
            // DESIGN.md.
            max_quality_score: 10.0,
            series_penalty_alpha: 0.7,
            max_episodes_per_series: 2,
            category_anchor_weight: 0.15,
            cold_start: ColdStartWeights::default(),
            default_similarity_on_missing: 0.5,
            sim_fallback_logging_enabled: true,
            embedding_dimensions: 1536,
        }
    }
}

impl RecommendationConfig {
    /// Build a config by merging `overrides` onto [`RecommendationConfig::default`]
    /// and validating the result.
    pub fn with_overrides(
        overrides: &RecommendationConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        overrides.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Validate every numeric constraint, returning `ConfigInvalid` on the
    /// first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite_fields: &[(&str, f64)] = &[
            ("weight_similarity", self.weight_similarity),
            ("weight_quality", self.weight_quality),
            ("weight_recency", self.weight_recency),
            ("recency_lambda", self.recency_lambda),
            ("credibility_multiplier", self.credibility_multiplier),
            ("max_quality_score", self.max_quality_score),
            ("series_penalty_alpha", self.series_penalty_alpha),
            ("category_anchor_weight", self.category_anchor_weight),
            ("cold_start.weight_quality", self.cold_start.weight_quality),
            ("cold_start.weight_recency", self.cold_start.weight_recency),
            (
                "default_similarity_on_missing",
                self.default_similarity_on_missing,
            ),
            ("engagement_weights.click", self.engagement_weights.click),
            (
                "engagement_weights.bookmark",
                self.engagement_weights.bookmark,
            ),
            (
                "engagement_weights.listen",
                self.engagement_weights.listen,
            ),
        ];
        for (name, value) in finite_fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field: name.to_string() });
            }
        }

        let nonnegative_fields: &[(&str, f64)] = &[
            ("weight_similarity", self.weight_similarity),
            ("weight_quality", self.weight_quality),
            ("weight_recency", self.weight_recency),
            ("cold_start.weight_quality", self.cold_start.weight_quality),
            ("cold_start.weight_recency", self.cold_start.weight_recency),
            ("recency_lambda", self.recency_lambda),
            ("series_penalty_alpha", self.series_penalty_alpha),
            ("category_anchor_weight", self.category_anchor_weight),
            (
                "default_similarity_on_missing",
                self.default_similarity_on_missing,
            ),
        ];
        for (name, value) in nonnegative_fields {
            if *value < 0.0 {
                return Err(ConfigError::Negative { field: name.to_string() });
            }
        }

        if !(0..=4).contains(&self.credibility_floor) {
            return Err(ConfigError::InconsistentFloor(
                "credibility_floor must be within 0..=4".to_string(),
            ));
        }
        if self.combined_floor < 0 || self.combined_floor > 8 {
            return Err(ConfigError::InconsistentFloor(
                "combined_floor must be within 0..=8".to_string(),
            ));
        }
        if self.freshness_window_days < 0 {
            return Err(ConfigError::Negative {
                field: "freshness_window_days".to_string(),
            });
        }
        if self.candidate_pool_size == 0 {
            return Err(ConfigError::InconsistentFloor(
                "candidate_pool_size must be positive".to_string(),
            ));
        }
        if self.max_episodes_per_series == 0 {
            return Err(ConfigError::InconsistentFloor(
                "max_episodes_per_series must be positive".to_string(),
            ));
        }
        if self.embedding_dimensions == 0 {
            return Err(ConfigError::InconsistentFloor(
                "embedding_dimensions must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// An all-optional mirror of [`RecommendationConfig`], the explicit
/// override map a deployment layers on top of the defaults. Deserializing
/// an overrides document with an unknown key is rejected rather than
/// silently ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecommendationConfigOverrides {
    pub credibility_floor: Option<i32>,
    pub combined_floor: Option<i32>,
    pub freshness_window_days: Option<i64>,
    pub candidate_pool_size: Option<usize>,
    pub user_vector_limit: Option<usize>,
    pub engagement_weights: Option<EngagementWeightsOverrides>,
    pub use_weighted_engagements: Option<bool>,
    pub weight_similarity: Option<f64>,
    pub weight_quality: Option<f64>,
    pub weight_recency: Option<f64>,
    pub recency_lambda: Option<f64>,
    pub credibility_multiplier: Option<f64>,
    pub max_quality_score: Option<f64>,
    pub series_penalty_alpha: Option<f64>,
    pub max_episodes_per_series: Option<usize>,
    pub category_anchor_weight: Option<f64>,
    pub cold_start: Option<ColdStartWeightsOverrides>,
    pub default_similarity_on_missing: Option<f64>,
    pub sim_fallback_logging_enabled: Option<bool>,
    pub embedding_dimensions: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EngagementWeightsOverrides {
    pub click: Option<f64>,
    pub bookmark: Option<f64>,
    pub listen: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ColdStartWeightsOverrides {
    pub weight_quality: Option<f64>,
    pub weight_recency: Option<f64>,
}

impl RecommendationConfigOverrides {
    /// Apply every `Some` field onto `config` in place.
    fn apply_to(&self, config: &mut RecommendationConfig) {
        macro_rules! apply {
            ($field:ident) => {
                if let Some(v) = self.$field {
                    config.$field = v;
                }
            };
        }
        apply!(credibility_floor);
        apply!(combined_floor);
        apply!(freshness_window_days);
        apply!(candidate_pool_size);
        apply!(user_vector_limit);
        apply!(use_weighted_engagements);
        apply!(weight_similarity);
        apply!(weight_quality);
        apply!(weight_recency);
        apply!(recency_lambda);
        apply!(credibility_multiplier);
        apply!(max_quality_score);
        apply!(series_penalty_alpha);
        apply!(max_episodes_per_series);
        apply!(category_anchor_weight);
        apply!(default_similarity_on_missing);
        apply!(sim_fallback_logging_enabled);
        apply!(embedding_dimensions);

        if let Some(ref ew) = self.engagement_weights {
            if let Some(v) = ew.click {
                config.engagement_weights.click = v;
            }
            if let Some(v) = ew.bookmark {
                config.engagement_weights.bookmark = v;
            }
            if let Some(v) = ew.listen {
                config.engagement_weights.listen = v;
            }
        }
        if let Some(ref cs) = self.cold_start {
            if let Some(v) = cs.weight_quality {
                config.cold_start.weight_quality = v;
            }
            if let Some(v) = cs.weight_recency {
                config.cold_start.weight_recency = v;
            }
        }
    }
}

/// Configuration validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("field '{field}' must be finite")]
    NotFinite { field: String },
    #[error("field '{field}' must be nonnegative")]
    Negative { field: String },
    #[error("inconsistent floor constraint: {0}")]
    InconsistentFloor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        RecommendationConfig::default().validate().unwrap();
    }

    #[test]
    fn negative_blend_weight_is_rejected() {
        let overrides = RecommendationConfigOverrides {
            weight_similarity: Some(-0.1),
            ..Default::default()
        };
        let err = RecommendationConfig::with_overrides(&overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Negative { .. }));
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let overrides = RecommendationConfigOverrides {
            recency_lambda: Some(f64::NAN),
            ..Default::default()
        };
        let err = RecommendationConfig::with_overrides(&overrides).unwrap_err();
        assert!(matches!(err, ConfigError::NotFinite { .. }));
    }

    #[test]
    fn credibility_floor_out_of_range_is_rejected() {
        let overrides = RecommendationConfigOverrides {
            credibility_floor: Some(9),
            ..Default::default()
        };
        assert!(RecommendationConfig::with_overrides(&overrides).is_err());
    }

    #[test]
    fn zero_candidate_pool_size_is_rejected() {
        let overrides = RecommendationConfigOverrides {
            candidate_pool_size: Some(0),
            ..Default::default()
        };
        assert!(RecommendationConfig::with_overrides(&overrides).is_err());
    }

    #[test]
    fn overrides_merge_onto_defaults() {
        let overrides = RecommendationConfigOverrides {
            candidate_pool_size: Some(50),
            engagement_weights: Some(EngagementWeightsOverrides {
                click: Some(2.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = RecommendationConfig::with_overrides(&overrides).unwrap();
        assert_eq!(config.candidate_pool_size, 50);
        assert_eq!(config.engagement_weights.click, 2.0);
        // untouched fields keep their defaults
        assert_eq!(config.engagement_weights.bookmark, 10.0);
        assert_eq!(config.credibility_floor, 2);
    }

    #[test]
    fn unknown_key_is_rejected_at_deserialization() {
        let json = serde_json::json!({ "totallyUnknownField": 1 });
        let result: Result<RecommendationConfigOverrides, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn engagement_weights_usability() {
        let usable = EngagementWeights::default();
        assert!(usable.is_usable());

        let all_zero = EngagementWeights {
            click: 0.0,
            bookmark: 0.0,
            listen: 0.0,
        };
        assert!(!all_zero.is_usable());

        let negative = EngagementWeights {
            click: -1.0,
            bookmark: 10.0,
            listen: 1.5,
        };
        assert!(!negative.is_usable());
    }
}
