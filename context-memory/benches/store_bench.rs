//! Store benchmarks
//!
//! Measures structured put/get and document put/search throughput against
//! temporary on-disk stores.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use context_memory::{
    fields_from_value, Document, EmbeddingEngine, HashingEmbedder, IndexConfig, Namespace,
    StructuredStore, VectorStore,
};
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;

fn bench_structured(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let store = StructuredStore::new(dir.path()).unwrap();
    let ns = Namespace::new(["bench", "tenant_1"]);
    let value = fields_from_value(json!({"theme": "dark", "verbosity": 2})).unwrap();

    c.bench_function("structured_put", |b| {
        b.iter(|| {
            rt.block_on(store.put(&ns, black_box("preferences"), value.clone()))
                .unwrap()
        })
    });

    rt.block_on(store.put(&ns, "preferences", value)).unwrap();
    c.bench_function("structured_get", |b| {
        b.iter(|| {
            rt.block_on(store.get(&ns, black_box("preferences")))
                .unwrap()
        })
    });
}

fn bench_vector(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(EmbeddingEngine::new(Arc::new(HashingEmbedder::default())));
    let store = VectorStore::new(dir.path(), IndexConfig::new(engine)).unwrap();
    let ns = Namespace::new(["bench", "tenant_1"]);

    let texts = [
        "How do I implement authentication?",
        "Deploy pipeline failed on the staging cluster",
        "Postgres connection pooling keeps exhausting clients",
        "What is the retention policy for session logs?",
        "Customer asked about dark mode support",
    ];
    for (i, text) in texts.iter().enumerate() {
        let doc = Document::builder()
            .id(format!("doc_{}", i))
            .text(*text)
            .timestamp(Utc::now())
            .build()
            .unwrap();
        rt.block_on(store.put(&ns, doc)).unwrap();
    }

    c.bench_function("vector_put", |b| {
        let mut i = 0_u64;
        b.iter(|| {
            i += 1;
            let doc = Document::builder()
                .id(format!("bench_{}", i))
                .text("database connection pooling under load")
                .timestamp(Utc::now())
                .build()
                .unwrap();
            rt.block_on(store.put(&ns, doc)).unwrap()
        })
    });

    c.bench_function("vector_search", |b| {
        b.iter(|| {
            rt.block_on(store.search(&ns, black_box("authentication help"), 3))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_structured, bench_vector);
criterion_main!(benches);
