//! Shared RocksDB open path
//!
//! Both stores open their databases the same way: LZ4 compression, bounded
//! background work, and a format-version stamp checked on open.

use rocksdb::{Options, DB};
use std::path::Path;

use crate::error::{MemoryError, Result};

/// Database format version stored in metadata
const DB_VERSION_KEY: &[u8] = b"_db_version";
const CURRENT_VERSION: u32 = 1;

/// Open (or create) a store database at the given path
pub(crate) fn open(path: &Path) -> Result<DB> {
    std::fs::create_dir_all(path)?;

    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.set_max_background_jobs(2);
    opts.set_bytes_per_sync(1048576); // 1MB
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

    let db = DB::open(&opts, path)?;

    match db.get(DB_VERSION_KEY)? {
        Some(bytes) => {
            let bytes_slice: &[u8] = bytes.as_ref();
            let version_bytes: [u8; 4] = bytes_slice
                .try_into()
                .map_err(|_| MemoryError::invalid_path("Invalid version stamp format"))?;
            let version = u32::from_le_bytes(version_bytes);
            if version != CURRENT_VERSION {
                return Err(MemoryError::invalid_path(format!(
                    "Unsupported database version {} at {} (expected {})",
                    version,
                    path.display(),
                    CURRENT_VERSION
                )));
            }
        }
        None => {
            db.put(DB_VERSION_KEY, CURRENT_VERSION.to_le_bytes())?;
            db.flush()?;
        }
    }

    Ok(db)
}
