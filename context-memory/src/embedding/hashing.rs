//! Deterministic hashing embedder
//!
//! Bag-of-tokens embedding: each token is hashed into a bucket and the
//! resulting vector is L2-normalized. Deterministic across processes, so
//! identical text always embeds identically. Suitable for tests and for
//! deployments that want similarity search without a learned model.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::Embedder;
use crate::error::Result;

/// Token-hashing embedder
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Default vector dimensionality
    pub const DEFAULT_DIMENSION: usize = 256;

    /// Create an embedder producing vectors of the given dimensionality
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be non-zero");
        Self { dimension }
    }

    /// Tokenize text into terms
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() > 2)
            .map(String::from)
            .collect()
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dimension];

        for token in Self::tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
