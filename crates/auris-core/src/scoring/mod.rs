//! Pure scoring primitives.
//!
//! Deterministic functions with no I/O and no configuration state beyond
//! their explicit arguments. All inputs are assumed finite; outputs are
//! finite and bounded as documented per function.

use chrono::{DateTime, Utc};

/// Compute cosine similarity between two equal-length vectors.
///
/// Returns a value in `[-1, 1]`. Fails with [`crate::Error::DimensionMismatch`]
/// when `a.len() != b.len()`. If either vector has zero norm the result is
/// `0.0` (no direction to compare against), not an error.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> crate::Result<f64> {
    if a.len() != b.len() {
        return Err(crate::Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(cosine_similarity_unchecked(a, b))
}

/// Cosine similarity without a length check, used at call sites that have
/// already validated dimensions or that want a silent-zero fallback for a
/// mismatch rather than a hard error (the blended-score stage's
/// `default_similarity_on_missing` path goes through here after its own
/// dimension check, never through this function's mismatch branch).
#[inline]
pub(crate) fn cosine_similarity_unchecked(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = (norm_a * norm_b).sqrt();
    if denom > 0.0 {
        (dot / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Nonnegative integer number of whole UTC days between `published_at` and
/// `now`, floored. Negative elapsed time (a future-dated episode, or clock
/// skew) clips to `0`.
pub fn days_since(published_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = now.signed_duration_since(published_at);
    elapsed.num_days().max(0)
}

/// Credibility-weighted, insight-blended quality score normalized to
/// `[0, 1]`.
///
/// `min(max_quality_score, credibility_multiplier * credibility + insight) /
/// (credibility_multiplier * 4 + 4)` — `max_quality_score` caps the
/// numerator *before* normalization.
pub fn quality_score(
    credibility: i32,
    insight: i32,
    credibility_multiplier: f64,
    max_quality_score: f64,
) -> f64 {
    let numerator = (credibility_multiplier * credibility as f64 + insight as f64)
        .min(max_quality_score)
        .max(0.0);
    let denominator = credibility_multiplier * 4.0 + 4.0;
    if denominator <= 0.0 {
        return 0.0;
    }
    (numerator / denominator).clamp(0.0, 1.0)
}

/// Exponential recency decay: `exp(-recency_lambda * days_old)`, in `(0, 1]`.
pub fn recency_score(days_old: i64, recency_lambda: f64) -> f64 {
    (-recency_lambda * days_old.max(0) as f64).exp()
}
