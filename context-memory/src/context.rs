//! Context manager over the two stores
//!
//! Uniform read/write interface over the structured store and an optional
//! similarity store, plus the aggregation that assembles a context bundle
//! for one query. Stateless between calls; all state lives in the stores.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::fields::Fields;
use crate::namespace::Namespace;
use crate::structured::StructuredStore;
use crate::vector::VectorStore;

/// Structured key holding caller preferences
pub const PREFERENCES_KEY: &str = "preferences";

/// Structured key holding interaction history
pub const HISTORY_KEY: &str = "history";

/// Timestamp field merged into every structured write
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// How many documents a context bundle carries
pub const CONTEXT_SEARCH_LIMIT: usize = 2;

/// Configuration for a `ContextManager`
///
/// The similarity store slot is optional: without it, document writes are
/// dropped and searches return empty results.
pub struct ContextConfig {
    structured: Arc<StructuredStore>,
    similarity: Option<Arc<VectorStore>>,
    clock: Arc<dyn Clock>,
}

impl ContextConfig {
    /// Configuration with a structured store only
    pub fn new(structured: Arc<StructuredStore>) -> Self {
        Self {
            structured,
            similarity: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Attach a similarity store
    pub fn with_similarity(mut self, similarity: Arc<VectorStore>) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Substitute the write clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Aggregated context for one query
///
/// Ephemeral: constructed fresh per request from the two stores and not
/// persisted anywhere.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    /// Structured preferences for the namespace
    pub preferences: Fields,
    /// Structured interaction history for the namespace
    pub history: Fields,
    /// Documents ranked by similarity to the query
    pub relevant_documents: Vec<Document>,
    /// The original query, verbatim
    pub query: String,
}

/// Mediates reads and writes across the two stores
pub struct ContextManager {
    structured: Arc<StructuredStore>,
    similarity: Option<Arc<VectorStore>>,
    clock: Arc<dyn Clock>,
}

impl ContextManager {
    /// Create a manager from its configuration
    pub fn new(config: ContextConfig) -> Self {
        Self {
            structured: config.structured,
            similarity: config.similarity,
            clock: config.clock,
        }
    }

    /// Whether a similarity store is configured
    pub fn has_similarity(&self) -> bool {
        self.similarity.is_some()
    }

    /// Write a structured value under `(namespace, key)`
    ///
    /// The value is stored merged with a freshly generated `updated_at`
    /// timestamp. Last write wins for concurrent writers of one key.
    pub async fn put_structured(
        &self,
        namespace: &Namespace,
        key: &str,
        mut value: Fields,
    ) -> Result<()> {
        value.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::String(self.clock.now().to_rfc3339()),
        );
        self.structured.put(namespace, key, value).await
    }

    /// Read the structured value under `(namespace, key)`
    ///
    /// An absent key reads as an empty map.
    pub async fn get_structured(&self, namespace: &Namespace, key: &str) -> Result<Fields> {
        self.structured.get(namespace, key).await
    }

    /// Store a document for similarity search
    ///
    /// Fills in the timestamp and a time-derived id when the caller left
    /// them unset. Without a configured similarity store this is a no-op
    /// returning `None`.
    pub async fn put_document(
        &self,
        namespace: &Namespace,
        mut document: Document,
    ) -> Result<Option<DocumentId>> {
        let Some(similarity) = &self.similarity else {
            log::debug!("Similarity store not configured; dropping document");
            return Ok(None);
        };

        let timestamp = *document
            .timestamp
            .get_or_insert_with(|| self.clock.now());
        if document.id.is_none() {
            document.id = Some(DocumentId::from_timestamp(timestamp));
        }

        similarity.put(namespace, document).await.map(Some)
    }

    /// Search the namespace for documents similar to the query
    ///
    /// Without a configured similarity store this returns an empty sequence
    /// for any query and limit; store failures propagate unchanged.
    pub async fn search_documents(
        &self,
        namespace: &Namespace,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Document>> {
        match &self.similarity {
            None => Ok(Vec::new()),
            Some(similarity) => similarity.search(namespace, query, limit).await,
        }
    }

    /// Assemble the context bundle for one query
    ///
    /// Issues the two structured reads and the similarity search
    /// concurrently; completion order is unobservable. Structured-read
    /// failures propagate. A failing similarity search degrades to an empty
    /// document list, the same shape an unconfigured store produces.
    pub async fn get_context(&self, namespace: &Namespace, query: &str) -> Result<ContextBundle> {
        let preferences = self.structured.get(namespace, PREFERENCES_KEY);
        let history = self.structured.get(namespace, HISTORY_KEY);
        let documents = async {
            match &self.similarity {
                None => Ok(Vec::new()),
                Some(similarity) => {
                    similarity
                        .search(namespace, query, CONTEXT_SEARCH_LIMIT)
                        .await
                }
            }
        };

        let (preferences, history, documents) = tokio::join!(preferences, history, documents);

        let relevant_documents = documents.unwrap_or_else(|e| {
            log::warn!("Similarity search failed while assembling context: {}", e);
            Vec::new()
        });

        Ok(ContextBundle {
            preferences: preferences?,
            history: history?,
            relevant_documents,
            query: query.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::document::Sentiment;
    use crate::embedding::{Embedder, EmbeddingEngine, HashingEmbedder};
    use crate::error::MemoryError;
    use crate::fields::fields_from_value;
    use crate::vector::IndexConfig;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    /// Embedder that refuses one specific text, to force search failures
    struct RefusingEmbedder {
        refuse: &'static str,
        inner: HashingEmbedder,
    }

    impl Embedder for RefusingEmbedder {
        fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            if text == self.refuse {
                return Err(MemoryError::embedding("embedder offline"));
            }
            self.inner.embed(text)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    fn fixed_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        ))
    }

    fn structured_only(dir: &TempDir, clock: Arc<ManualClock>) -> ContextManager {
        let structured =
            Arc::new(StructuredStore::new(dir.path().join("structured")).expect("structured"));
        ContextManager::new(ContextConfig::new(structured).with_clock(clock))
    }

    fn dual_store(dir: &TempDir, clock: Arc<ManualClock>) -> ContextManager {
        let structured =
            Arc::new(StructuredStore::new(dir.path().join("structured")).expect("structured"));
        let engine = Arc::new(EmbeddingEngine::new(Arc::new(HashingEmbedder::default())));
        let similarity = Arc::new(
            VectorStore::new(dir.path().join("similarity"), IndexConfig::new(engine))
                .expect("similarity"),
        );
        ContextManager::new(
            ContextConfig::new(structured)
                .with_similarity(similarity)
                .with_clock(clock),
        )
    }

    #[tokio::test]
    async fn test_put_structured_merges_timestamp() {
        let dir = TempDir::new().unwrap();
        let clock = fixed_clock();
        let manager = structured_only(&dir, Arc::clone(&clock));
        let ns = Namespace::new(["user_data", "assistant_1"]);

        let written = fields_from_value(json!({"theme": "dark", "verbosity": 2})).unwrap();
        manager
            .put_structured(&ns, PREFERENCES_KEY, written.clone())
            .await
            .unwrap();

        let loaded = manager.get_structured(&ns, PREFERENCES_KEY).await.unwrap();

        // Superset of the written fields, values unchanged
        for (field, value) in &written {
            assert_eq!(loaded.get(field), Some(value));
        }
        assert_eq!(
            loaded.get(UPDATED_AT_FIELD),
            Some(&json!(clock.now().to_rfc3339()))
        );
    }

    #[tokio::test]
    async fn test_get_structured_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let manager = structured_only(&dir, fixed_clock());
        let ns = Namespace::new(["user_data", "assistant_1"]);

        let loaded = manager.get_structured(&ns, "never_written").await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_search_documents_unconfigured_is_empty() {
        let dir = TempDir::new().unwrap();
        let manager = structured_only(&dir, fixed_clock());
        let ns = Namespace::new(["conversations", "user_123"]);

        for limit in [0, 1, 3, 100] {
            let results = manager.search_documents(&ns, "anything", limit).await.unwrap();
            assert!(results.is_empty());
        }
    }

    #[tokio::test]
    async fn test_put_document_unconfigured_is_noop() {
        let dir = TempDir::new().unwrap();
        let manager = structured_only(&dir, fixed_clock());
        let ns = Namespace::new(["conversations", "user_123"]);

        let stored = manager
            .put_document(&ns, Document::builder().text("hello").build().unwrap())
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_put_document_assigns_id_and_timestamp() {
        let dir = TempDir::new().unwrap();
        let clock = fixed_clock();
        let manager = dual_store(&dir, Arc::clone(&clock));
        let ns = Namespace::new(["conversations", "user_123"]);

        let id = manager
            .put_document(&ns, Document::builder().text("hello there").build().unwrap())
            .await
            .unwrap()
            .expect("similarity store is configured");

        assert_eq!(id, DocumentId::from_timestamp(clock.now()));

        let results = manager.search_documents(&ns, "hello there", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_ref(), Some(&id));
        assert_eq!(results[0].timestamp, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_store_then_search_round_trip() {
        let dir = TempDir::new().unwrap();
        let manager = dual_store(&dir, fixed_clock());
        let ns = Namespace::new(["conversations", "user_123"]);

        manager
            .put_document(
                &ns,
                Document::builder()
                    .text("How do I implement authentication?")
                    .topic("analysis")
                    .sentiment(Sentiment::Analytical)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let results = manager
            .search_documents(&ns, "authentication help", 3)
            .await
            .unwrap();
        assert!(results
            .iter()
            .any(|d| d.text == "How do I implement authentication?"));
    }

    #[tokio::test]
    async fn test_get_context_without_similarity() {
        let dir = TempDir::new().unwrap();
        let manager = structured_only(&dir, fixed_clock());
        let ns = Namespace::new(["user_data", "assistant_1"]);

        manager
            .put_structured(
                &ns,
                PREFERENCES_KEY,
                fields_from_value(json!({"theme": "dark"})).unwrap(),
            )
            .await
            .unwrap();

        let bundle = manager.get_context(&ns, "what was my theme?").await.unwrap();

        assert_eq!(bundle.preferences.get("theme"), Some(&json!("dark")));
        assert!(bundle.history.is_empty());
        assert!(bundle.relevant_documents.is_empty());
        assert_eq!(bundle.query, "what was my theme?");

        // The serialized bundle carries exactly the four named fields
        let as_json = serde_json::to_value(&bundle).unwrap();
        let object = as_json.as_object().unwrap();
        assert_eq!(object.len(), 4);
        for field in ["preferences", "history", "relevant_documents", "query"] {
            assert!(object.contains_key(field));
        }
    }

    #[tokio::test]
    async fn test_get_context_with_similarity() {
        let dir = TempDir::new().unwrap();
        let manager = dual_store(&dir, fixed_clock());
        let ns = Namespace::new(["conversations", "user_123"]);

        manager
            .put_structured(
                &ns,
                HISTORY_KEY,
                fields_from_value(json!({"turns": 4})).unwrap(),
            )
            .await
            .unwrap();
        manager
            .put_document(
                &ns,
                Document::builder()
                    .id("conv_auth")
                    .text("How do I implement authentication?")
                    .topic("analysis")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let bundle = manager.get_context(&ns, "authentication help").await.unwrap();

        assert_eq!(bundle.history.get("turns"), Some(&json!(4)));
        assert!(!bundle.relevant_documents.is_empty());
        assert!(bundle.relevant_documents.len() <= CONTEXT_SEARCH_LIMIT);
        assert_eq!(bundle.query, "authentication help");
    }

    #[tokio::test]
    async fn test_get_context_degrades_when_search_fails() {
        let dir = TempDir::new().unwrap();
        let structured =
            Arc::new(StructuredStore::new(dir.path().join("structured")).expect("structured"));
        let engine = Arc::new(EmbeddingEngine::new(Arc::new(RefusingEmbedder {
            refuse: "authentication help",
            inner: HashingEmbedder::default(),
        })));
        let similarity = Arc::new(
            VectorStore::new(dir.path().join("similarity"), IndexConfig::new(engine))
                .expect("similarity"),
        );
        let manager = ContextManager::new(
            ContextConfig::new(structured)
                .with_similarity(similarity)
                .with_clock(fixed_clock()),
        );
        let ns = Namespace::new(["conversations", "user_123"]);

        manager
            .put_document(&ns, Document::builder().text("stored fine").build().unwrap())
            .await
            .unwrap();

        // The bundle degrades to an empty document list
        let bundle = manager.get_context(&ns, "authentication help").await.unwrap();
        assert!(bundle.relevant_documents.is_empty());
        assert_eq!(bundle.query, "authentication help");

        // The standalone search surfaces the same failure unchanged
        let direct = manager
            .search_documents(&ns, "authentication help", 3)
            .await;
        assert!(matches!(direct, Err(MemoryError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_concurrent_puts_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let manager = Arc::new(structured_only(&dir, fixed_clock()));
        let ns = Namespace::new(["user_data", "assistant_1"]);

        let first = {
            let manager = Arc::clone(&manager);
            let ns = ns.clone();
            tokio::spawn(async move {
                manager
                    .put_structured(
                        &ns,
                        PREFERENCES_KEY,
                        fields_from_value(json!({"theme": "dark"})).unwrap(),
                    )
                    .await
            })
        };
        let second = {
            let manager = Arc::clone(&manager);
            let ns = ns.clone();
            tokio::spawn(async move {
                manager
                    .put_structured(
                        &ns,
                        PREFERENCES_KEY,
                        fields_from_value(json!({"theme": "light"})).unwrap(),
                    )
                    .await
            })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let loaded = manager.get_structured(&ns, PREFERENCES_KEY).await.unwrap();

        // Exactly one of the two values survives, never a blend
        let theme = loaded.get("theme").and_then(|v| v.as_str()).unwrap();
        assert!(theme == "dark" || theme == "light");
        let mut fields: Vec<&str> = loaded.keys().map(String::as_str).collect();
        fields.sort_unstable();
        assert_eq!(fields, vec!["theme", UPDATED_AT_FIELD]);
    }
}
