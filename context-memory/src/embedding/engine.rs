//! Embedding engine with caching
//!
//! High-level API over an injected `Embedder` with a text-to-vector cache
//! for efficient repeated lookups.

use dashmap::DashMap;
use std::sync::Arc;

use super::Embedder;
use crate::error::Result;

/// Caching wrapper around an embedder
pub struct EmbeddingEngine {
    embedder: Arc<dyn Embedder>,
    cache: DashMap<String, Vec<f32>>,
    dimension: usize,
}

impl EmbeddingEngine {
    /// Create an engine around the given embedder
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let dimension = embedder.dimension();

        log::info!("EmbeddingEngine ready ({}d)", dimension);

        Self {
            embedder,
            cache: DashMap::new(),
            dimension,
        }
    }

    /// Generate embedding with caching
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Check cache first
        if let Some(cached) = self.cache.get(text) {
            return Ok(cached.clone());
        }

        // Generate and cache
        let embedding = self.embedder.embed(text)?;
        self.cache.insert(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// Batch embed with caching
    ///
    /// Cache hits are served directly; only the misses reach the embedder,
    /// in one batch call.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut misses = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(*text) {
                Some(cached) => results[i] = Some(cached.clone()),
                None => misses.push(i),
            }
        }

        if !misses.is_empty() {
            let uncached: Vec<&str> = misses.iter().map(|&i| texts[i]).collect();
            let embeddings = self.embedder.embed_batch(&uncached)?;
            for (&i, embedding) in misses.iter().zip(embeddings) {
                self.cache.insert(texts[i].to_string(), embedding.clone());
                results[i] = Some(embedding);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
