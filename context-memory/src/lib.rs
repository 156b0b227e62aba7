//! Context Memory
//!
//! Dual-store context retrieval layer for AI agents: namespaced key-value
//! records for structured data plus semantic document search, aggregated
//! into per-query context bundles.
//!
//! ## Features
//!
//! - **Structured store** - Exact-match key-value records scoped by namespace
//! - **Similarity store** - Embedding-backed document search with an HNSW index
//! - **Context bundles** - Preferences, history and relevant documents assembled concurrently per query
//! - **RocksDB persistence** - Both stores survive restarts; caches rebuild on open
//!
//! ## Example
//!
//! ```ignore
//! use context_memory::{
//!     ContextConfig, ContextManager, Document, EmbeddingEngine, HashingEmbedder,
//!     IndexConfig, Namespace, StructuredStore, VectorStore,
//! };
//! use std::sync::Arc;
//!
//! // Open both stores
//! let structured = Arc::new(StructuredStore::new("data/structured")?);
//! let engine = Arc::new(EmbeddingEngine::new(Arc::new(HashingEmbedder::default())));
//! let similarity = Arc::new(VectorStore::new("data/similarity", IndexConfig::new(engine))?);
//!
//! let manager = ContextManager::new(
//!     ContextConfig::new(structured).with_similarity(similarity),
//! );
//!
//! // Remember a conversation and retrieve context for the next turn
//! let ns = Namespace::new(["conversations", "user_123"]);
//! manager.put_document(&ns, Document::builder()
//!     .text("How do I implement authentication?")
//!     .topic("analysis")
//!     .build()?).await?;
//!
//! let bundle = manager.get_context(&ns, "authentication help").await?;
//! ```

pub mod clock;
pub mod context;
mod db;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fields;
pub mod namespace;
pub mod structured;
pub mod vector;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{
    ContextBundle, ContextConfig, ContextManager, CONTEXT_SEARCH_LIMIT, HISTORY_KEY,
    PREFERENCES_KEY, UPDATED_AT_FIELD,
};
pub use document::{Document, DocumentBuilder, DocumentBuilderError, DocumentId, Sentiment};
pub use embedding::{cosine_similarity, Embedder, EmbeddingEngine, HashingEmbedder};
pub use error::{MemoryError, Result};
pub use fields::{fields_from_value, Fields};
pub use namespace::Namespace;
pub use structured::StructuredStore;
pub use vector::{EmbedField, IndexConfig, VectorStore};
