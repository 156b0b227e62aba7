//! Namespaced key-value store for structured records
//!
//! Exact-match lookups over RocksDB with a read cache. Values are
//! schema-less JSON field maps; an absent key reads as an empty map.

use dashmap::DashMap;
use rocksdb::{IteratorMode, DB};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::fields::Fields;
use crate::namespace::{encode_key, Namespace};

/// Key class for structured records inside the database
const RECORD_PREFIX: &str = "rec:";

/// RocksDB-backed structured store
///
/// Writes overwrite the whole value for a `(namespace, key)`; there is no
/// merge with the previous record and no delete path. Concurrent writers
/// race whole values, so a read always observes exactly one write.
pub struct StructuredStore {
    db: Arc<DB>,
    cache: Arc<DashMap<String, Fields>>,
}

impl StructuredStore {
    /// Open a structured store at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = crate::db::open(path)?;

        log::info!("StructuredStore opened at: {}", path.display());

        let store = Self {
            db: Arc::new(db),
            cache: Arc::new(DashMap::new()),
        };

        store.load_cache()?;
        Ok(store)
    }

    /// Load existing records into the cache on startup
    fn load_cache(&self) -> Result<()> {
        let mut count = 0;
        let mut skipped = 0;
        let iter = self.db.iterator(IteratorMode::Start);

        for item in iter {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);

            if !key_str.starts_with(RECORD_PREFIX) {
                continue;
            }

            // Gracefully handle deserialization errors
            match serde_json::from_slice::<Fields>(&value) {
                Ok(fields) => {
                    self.cache.insert(key_str.into_owned(), fields);
                    count += 1;
                }
                Err(e) => {
                    log::warn!("Failed to deserialize record {}: {}. Skipping.", key_str, e);
                    skipped += 1;
                }
            }
        }

        if count > 0 {
            log::info!("Loaded {} structured records from disk", count);
            if skipped > 0 {
                log::warn!("Skipped {} records due to deserialization errors", skipped);
            }
        }

        Ok(())
    }

    /// Store a value under `(namespace, key)`
    ///
    /// Replaces any previous value entirely. Writing a new key is not an
    /// error.
    pub async fn put(&self, namespace: &Namespace, key: &str, value: Fields) -> Result<()> {
        let full_key = encode_key(RECORD_PREFIX, namespace, key);
        self.db
            .put(full_key.as_bytes(), serde_json::to_vec(&value)?)?;
        self.cache.insert(full_key, value);
        self.db.flush()?;
        Ok(())
    }

    /// Get the value under `(namespace, key)`
    ///
    /// Returns an empty map when the key was never written; absence is not
    /// an error.
    pub async fn get(&self, namespace: &Namespace, key: &str) -> Result<Fields> {
        let full_key = encode_key(RECORD_PREFIX, namespace, key);

        if let Some(cached) = self.cache.get(&full_key) {
            return Ok(cached.clone());
        }

        match self.db.get(full_key.as_bytes())? {
            Some(bytes) => {
                let fields: Fields = serde_json::from_slice(&bytes)?;
                self.cache.insert(full_key, fields.clone());
                Ok(fields)
            }
            None => Ok(Fields::new()),
        }
    }

    /// Number of records currently cached
    pub fn record_count(&self) -> usize {
        self.cache.len()
    }
}
