//! Fixed-dimensional embedding vectors.

use serde::{Deserialize, Serialize};

/// A fixed-dimensional vector of finite floats, associated with an episode
/// by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The embedding vector.
    pub vector: Vec<f64>,
}

impl Embedding {
    /// Wrap a raw vector as an embedding.
    pub fn new(vector: Vec<f64>) -> Self {
        Self { vector }
    }

    /// Dimension of this embedding.
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.vector.iter().all(|v| v.is_finite())
    }
}

impl From<Vec<f64>> for Embedding {
    fn from(vector: Vec<f64>) -> Self {
        Self::new(vector)
    }
}

impl AsRef<[f64]> for Embedding {
    fn as_ref(&self) -> &[f64] {
        &self.vector
    }
}
