//! Namespaced similarity store with HNSW indexing
//!
//! Persistent document storage over RocksDB with per-namespace
//! instant-distance HNSW indexes for O(log n) nearest-neighbor search.
//! Documents are insert-and-search only: no update, no delete.

use dashmap::DashMap;
use instant_distance::{Builder, HnswMap, Point, Search};
use parking_lot::RwLock;
use rocksdb::{IteratorMode, DB};
use std::path::Path;
use std::sync::Arc;

use crate::document::{Document, DocumentId};
use crate::embedding::{cosine_similarity, EmbeddingEngine};
use crate::error::{MemoryError, Result};
use crate::namespace::{decode_key, encode_key, Namespace};

/// Key classes for documents and their vectors inside the database
const DOC_PREFIX: &str = "doc:";
const VEC_PREFIX: &str = "vec:";

/// HNSW point wrapper for similarity search
#[derive(Clone)]
struct DocPoint {
    id: DocumentId,
    vector: Vec<f32>,
}

impl Point for DocPoint {
    fn distance(&self, other: &Self) -> f32 {
        // Cosine distance = 1 - similarity (HNSW finds minimum)
        1.0 - cosine_similarity(&self.vector, &other.vector)
    }
}

/// Per-namespace search index
struct NamespaceIndex {
    points: Vec<DocPoint>,
    hnsw: Option<HnswMap<DocPoint, DocumentId>>,
}

impl NamespaceIndex {
    fn empty() -> Self {
        Self {
            points: Vec::new(),
            hnsw: None,
        }
    }

    /// Rebuild the HNSW index from the current points
    fn rebuild(&mut self) {
        if self.points.is_empty() {
            self.hnsw = None;
            return;
        }

        let points = self.points.clone();
        let values: Vec<DocumentId> = points.iter().map(|p| p.id.clone()).collect();
        self.hnsw = Some(
            Builder::default()
                .ef_construction(100)
                .build(points, values),
        );
    }
}

/// Which document fields participate in embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedField {
    Text,
    Topics,
}

/// Similarity-store configuration, fixed at construction
///
/// Carries the embedding engine, the expected vector dimensionality, and
/// the document fields that feed the embedding.
pub struct IndexConfig {
    engine: Arc<EmbeddingEngine>,
    dimensions: usize,
    embed_fields: Vec<EmbedField>,
}

impl IndexConfig {
    /// Configuration embedding text and topics at the engine's dimensionality
    pub fn new(engine: Arc<EmbeddingEngine>) -> Self {
        let dimensions = engine.dimension();
        Self {
            engine,
            dimensions,
            embed_fields: vec![EmbedField::Text, EmbedField::Topics],
        }
    }

    /// Restrict which document fields feed the embedding
    pub fn with_embed_fields(mut self, fields: Vec<EmbedField>) -> Self {
        self.embed_fields = fields;
        self
    }

    /// Assert the expected vector dimensionality
    ///
    /// Store construction fails when this disagrees with the engine.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Get the configured dimensionality
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Assemble the text that is embedded for a document
    fn embeddable_text(&self, document: &Document) -> String {
        let mut parts = Vec::new();
        for field in &self.embed_fields {
            match field {
                EmbedField::Text => parts.push(document.text.clone()),
                EmbedField::Topics => {
                    if !document.topics.is_empty() {
                        parts.push(
                            document
                                .topics
                                .iter()
                                .cloned()
                                .collect::<Vec<_>>()
                                .join(" "),
                        );
                    }
                }
            }
        }
        parts.join(" ")
    }
}

/// RocksDB-backed similarity store with per-namespace HNSW indexes
pub struct VectorStore {
    db: Arc<DB>,
    documents: Arc<DashMap<String, Document>>,
    indexes: Arc<DashMap<String, Arc<RwLock<NamespaceIndex>>>>,
    config: IndexConfig,
}

impl VectorStore {
    /// Open a similarity store at the given path
    pub fn new(path: impl AsRef<Path>, config: IndexConfig) -> Result<Self> {
        if config.dimensions != config.engine.dimension() {
            return Err(MemoryError::embedding(format!(
                "configured dimensionality {} does not match engine dimensionality {}",
                config.dimensions,
                config.engine.dimension()
            )));
        }

        let path = path.as_ref();
        let db = crate::db::open(path)?;

        log::info!("VectorStore opened at: {}", path.display());

        let store = Self {
            db: Arc::new(db),
            documents: Arc::new(DashMap::new()),
            indexes: Arc::new(DashMap::new()),
            config,
        };

        store.load_cache()?;
        Ok(store)
    }

    /// Load existing documents and vectors into caches on startup
    fn load_cache(&self) -> Result<()> {
        let mut count = 0;
        let mut skipped = 0;
        let mut vectors: Vec<(Namespace, DocumentId, Vec<f32>)> = Vec::new();
        let iter = self.db.iterator(IteratorMode::Start);

        for item in iter {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);

            if let Some((namespace, id)) = decode_key(DOC_PREFIX, &key_str) {
                // Gracefully handle deserialization errors
                match bincode::deserialize::<Document>(&value) {
                    Ok(document) => {
                        self.documents.insert(key_str.to_string(), document);
                        count += 1;
                    }
                    Err(e) => {
                        log::warn!(
                            "Failed to deserialize document {}/{}: {}. Skipping.",
                            namespace,
                            id,
                            e
                        );
                        skipped += 1;
                    }
                }
            } else if let Some((namespace, id)) = decode_key(VEC_PREFIX, &key_str) {
                match bincode::deserialize::<Vec<f32>>(&value) {
                    Ok(vector) => {
                        vectors.push((namespace, DocumentId::new(id), vector));
                    }
                    Err(e) => {
                        log::warn!("Failed to deserialize vector {}/{}: {}. Skipping.", namespace, id, e);
                    }
                }
            }
        }

        // Group loaded vectors into per-namespace indexes; a vector only
        // counts when its document also deserialized.
        for (namespace, id, vector) in vectors {
            let doc_key = encode_key(DOC_PREFIX, &namespace, id.as_str());
            if !self.documents.contains_key(&doc_key) {
                continue;
            }
            let entry = self
                .indexes
                .entry(namespace.encode())
                .or_insert_with(|| Arc::new(RwLock::new(NamespaceIndex::empty())))
                .clone();
            entry.write().points.push(DocPoint { id, vector });
        }

        for entry in self.indexes.iter() {
            entry.value().write().rebuild();
        }

        if count > 0 {
            log::info!("Loaded {} documents from disk", count);
            if skipped > 0 {
                log::warn!("Skipped {} documents due to deserialization errors", skipped);
            }
        }

        Ok(())
    }

    /// Store a document with its embedding
    ///
    /// Requires `id` and `timestamp` to be assigned; the context manager
    /// fills both before delegating here.
    pub async fn put(&self, namespace: &Namespace, document: Document) -> Result<DocumentId> {
        let id = document
            .id
            .clone()
            .ok_or_else(|| MemoryError::invalid_document("document id not assigned"))?;
        if document.timestamp.is_none() {
            return Err(MemoryError::invalid_document(
                "document timestamp not assigned",
            ));
        }

        let text = self.config.embeddable_text(&document);
        let vector = self.config.engine.embed(&text)?;
        if vector.len() != self.config.dimensions {
            return Err(MemoryError::embedding(format!(
                "embedding dimensionality {} does not match configured {}",
                vector.len(),
                self.config.dimensions
            )));
        }

        // Persist document and vector
        let doc_key = encode_key(DOC_PREFIX, namespace, id.as_str());
        let vec_key = encode_key(VEC_PREFIX, namespace, id.as_str());
        self.db
            .put(doc_key.as_bytes(), bincode::serialize(&document)?)?;
        self.db
            .put(vec_key.as_bytes(), bincode::serialize(&vector)?)?;
        self.db.flush()?;
        self.documents.insert(doc_key, document);

        // Update this namespace's index
        let entry = self
            .indexes
            .entry(namespace.encode())
            .or_insert_with(|| Arc::new(RwLock::new(NamespaceIndex::empty())))
            .clone();
        let mut index = entry.write();
        // A re-put of an existing id replaces its point, mirroring the
        // key-value overwrite above
        index.points.retain(|p| p.id != id);
        index.points.push(DocPoint {
            id: id.clone(),
            vector,
        });
        index.rebuild();

        Ok(id)
    }

    /// Search a namespace for documents similar to the query
    ///
    /// Returns up to `limit` documents ranked by cosine similarity. A
    /// namespace that holds no documents yields an empty result.
    pub async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Document>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let entry = match self.indexes.get(&namespace.encode()) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(Vec::new()),
        };

        let query_vector = self.config.engine.embed(query)?;
        let index = entry.read();

        let ranked: Vec<DocumentId> = match &index.hnsw {
            Some(hnsw) => {
                let query_point = DocPoint {
                    id: DocumentId::new("query"),
                    vector: query_vector,
                };
                let mut search = Search::default();
                hnsw.search(&query_point, &mut search)
                    .take(limit)
                    .map(|item| item.value.clone())
                    .collect()
            }
            None => Self::linear_search(&index.points, &query_vector, limit),
        };
        drop(index);

        let mut results = Vec::with_capacity(ranked.len());
        for id in ranked {
            let doc_key = encode_key(DOC_PREFIX, namespace, id.as_str());
            if let Some(document) = self.documents.get(&doc_key) {
                results.push(document.clone());
            }
        }

        Ok(results)
    }

    /// Linear search fallback
    fn linear_search(points: &[DocPoint], query_vector: &[f32], limit: usize) -> Vec<DocumentId> {
        let mut scored: Vec<(DocumentId, f32)> = points
            .iter()
            .map(|point| {
                (
                    point.id.clone(),
                    cosine_similarity(query_vector, &point.vector),
                )
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored.into_iter().map(|(id, _)| id).collect()
    }

    /// Number of documents currently cached across all namespaces
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}
