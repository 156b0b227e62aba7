//! Embedding seam for similarity search
//!
//! The embedding function is injected at similarity-store construction;
//! this module provides the trait, a caching engine around it, and a
//! deterministic hashing embedder.

mod engine;
mod hashing;

pub use engine::{cosine_similarity, EmbeddingEngine};
pub use hashing::HashingEmbedder;

use crate::error::Result;

/// Text-to-vector embedding function
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Dimensionality of the produced vectors
    fn dimension(&self) -> usize;
}
