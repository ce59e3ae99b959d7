//! Integration tests for the tiered memory store
//!
//! Tests the store's ability to:
//! - Round-trip every write through the JSON document
//! - Assign gap-free ids per tier
//! - Serialize concurrent writers without losing records
//! - Serve whole committed snapshots to searches during writes
//! - Filter by token overlap in deterministic order

use std::collections::BTreeMap;
use std::sync::Arc;

use recall::memory::{MemoryStore, MemoryTier};
use tempfile::tempdir;

/// Test fixture: store backed by a fresh temporary directory
async fn create_test_store() -> (MemoryStore, tempfile::TempDir) {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = MemoryStore::load(dir.path().join("memory_store.json"))
        .await
        .expect("Failed to load store");
    (store, dir)
}

fn meta(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_round_trip_reconstructs_identical_store() {
    let (store, _dir) = create_test_store().await;

    store
        .write(
            "Conversation with user_001: What is machine learning?...",
            MemoryTier::Episodic,
            meta(&[("user_id", "user_001"), ("query", "What is machine learning?")]),
        )
        .await
        .unwrap();
    store
        .add_fact("Machine learning enables systems to learn from data", "documentation")
        .await
        .unwrap();
    store
        .add_user_preference("user_001", "Interested in AI and machine learning")
        .await
        .unwrap();
    store
        .write("Second episode", MemoryTier::Episodic, BTreeMap::new())
        .await
        .unwrap();

    let before = store.snapshot().await;
    let reloaded = MemoryStore::load(store.path()).await.unwrap();

    assert_eq!(reloaded.snapshot().await, before);
    assert_eq!(reloaded.stats().await, store.stats().await);
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let (store, _dir) = create_test_store().await;
    store.add_fact("Rust has no garbage collector", "docs").await.unwrap();

    let on_disk = std::fs::read(store.path()).unwrap();
    let first = MemoryStore::load(store.path()).await.unwrap();
    let second = MemoryStore::load(store.path()).await.unwrap();

    assert_eq!(first.snapshot().await, second.snapshot().await);
    assert_eq!(std::fs::read(store.path()).unwrap(), on_disk);
}

#[tokio::test]
async fn test_document_schema_is_keyed_by_tier() {
    let (store, _dir) = create_test_store().await;
    store.add_fact("Python is a high-level programming language", "docs").await.unwrap();

    let doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();

    assert_eq!(doc["episodic"], serde_json::json!([]));
    assert_eq!(doc["procedural"], serde_json::json!([]));
    let fact = &doc["semantic"][0];
    assert_eq!(fact["id"], 1);
    assert_eq!(fact["content"], "Python is a high-level programming language");
    assert_eq!(fact["metadata"]["source"], "docs");
    assert!(fact["timestamp"].is_string());
    assert!(fact.get("tier").is_none());
}

#[tokio::test]
async fn test_loads_document_with_naive_timestamps() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memory_store.json");
    std::fs::write(
        &path,
        r#"{
            "episodic": [],
            "semantic": [
                {"id": 1, "content": "Machine learning enables systems to learn from data",
                 "timestamp": "2025-11-30T10:15:00.123456", "metadata": {"source": "documentation"}}
            ],
            "procedural": []
        }"#,
    )
    .unwrap();

    let store = MemoryStore::load(&path).await.unwrap();
    let records = store.list(MemoryTier::Semantic).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tier, MemoryTier::Semantic);
    assert_eq!(records[0].timestamp.to_rfc3339(), "2025-11-30T10:15:00.123456+00:00");
}

// =============================================================================
// Id assignment
// =============================================================================

#[tokio::test]
async fn test_ids_are_monotonic_per_tier() {
    let (store, _dir) = create_test_store().await;

    let mut episodic = Vec::new();
    let mut semantic = Vec::new();
    for i in 0..4 {
        episodic.push(
            store
                .write(format!("episode {i}"), MemoryTier::Episodic, BTreeMap::new())
                .await
                .unwrap()
                .id,
        );
        if i % 2 == 0 {
            semantic.push(store.add_fact(&format!("fact {i}"), "test").await.unwrap().id);
        }
    }

    assert_eq!(episodic, vec![1, 2, 3, 4]);
    assert_eq!(semantic, vec![1, 2]);
    assert!(store.list(MemoryTier::Procedural).await.is_empty());
}

#[tokio::test]
async fn test_concurrent_writes_are_serialized() {
    let (store, _dir) = create_test_store().await;
    let store = Arc::new(store);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .write(format!("concurrent {i}"), MemoryTier::Episodic, BTreeMap::new())
                    .await
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let ids: Vec<u64> = store
        .list(MemoryTier::Episodic)
        .await
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, (1..=16).collect::<Vec<_>>());

    let reloaded = MemoryStore::load(store.path()).await.unwrap();
    assert_eq!(reloaded.stats().await.episodic, 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_searches_during_writes_see_whole_records() {
    const WRITERS: u64 = 20;
    let (store, _dir) = create_test_store().await;
    let store = Arc::new(store);

    let writers: Vec<_> = (1..=WRITERS)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let seq = i.to_string();
                store
                    .write(
                        format!("concurrent record {i}"),
                        MemoryTier::Episodic,
                        meta(&[("writer", seq.as_str()), ("kind", "load")]),
                    )
                    .await
                    .unwrap();
            })
        })
        .collect();

    let searchers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                let mut observed = Vec::new();
                for _ in 0..50 {
                    let results = store.search("concurrent", &[MemoryTier::Episodic]).await;
                    observed.push(results);
                    tokio::task::yield_now().await;
                }
                observed
            })
        })
        .collect();

    for handle in writers {
        handle.await.unwrap();
    }

    for handle in searchers {
        for results in handle.await.unwrap() {
            let ids: Vec<u64> = results.iter().map(|r| r.id).collect();
            let expected: Vec<u64> = (1..=ids.len() as u64).collect();
            assert_eq!(ids, expected, "search saw a gap in committed ids");

            for record in &results {
                assert!(record.content.starts_with("concurrent record "));
                assert_eq!(record.metadata.get("kind").map(String::as_str), Some("load"));
                let seq = record.metadata.get("writer").expect("writer metadata missing");
                assert_eq!(record.content, format!("concurrent record {seq}"));
            }
        }
    }

    let final_results = store.search("concurrent", &[MemoryTier::Episodic]).await;
    assert_eq!(final_results.len() as u64, WRITERS);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_predicate_uses_token_overlap() {
    let (store, _dir) = create_test_store().await;
    store
        .add_fact("Machine learning enables systems to learn from data", "documentation")
        .await
        .unwrap();
    store
        .add_fact("Python is a high-level programming language", "documentation")
        .await
        .unwrap();

    let results = store.search("machine learning", &[MemoryTier::Semantic]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].content,
        "Machine learning enables systems to learn from data"
    );
}

#[tokio::test]
async fn test_search_orders_by_tier_then_insertion() {
    let (store, _dir) = create_test_store().await;
    store
        .add_user_preference("user_001", "Likes rust tutorials")
        .await
        .unwrap();
    store.add_fact("Rust is memory safe", "docs").await.unwrap();
    store
        .write("Asked about rust lifetimes", MemoryTier::Episodic, BTreeMap::new())
        .await
        .unwrap();
    store.add_fact("Rust compiles to native code", "docs").await.unwrap();

    let results = store
        .search(
            "rust",
            &[MemoryTier::Procedural, MemoryTier::Semantic, MemoryTier::Episodic],
        )
        .await;
    let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();

    assert_eq!(
        contents,
        vec![
            "Asked about rust lifetimes",
            "Rust is memory safe",
            "Rust compiles to native code",
            "Likes rust tutorials",
        ]
    );
}

#[tokio::test]
async fn test_search_respects_requested_tiers() {
    let (store, _dir) = create_test_store().await;
    store.add_fact("Tokio is an async runtime", "docs").await.unwrap();
    store
        .add_user_preference("user_001", "Prefers tokio examples")
        .await
        .unwrap();

    let results = store.search("tokio", &[MemoryTier::Procedural]).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tier, MemoryTier::Procedural);

    assert!(store.search("tokio", &[]).await.is_empty());
}

// =============================================================================
// Operator actions
// =============================================================================

#[tokio::test]
async fn test_delete_persists() {
    let (store, _dir) = create_test_store().await;
    store.add_fact("stale fact", "docs").await.unwrap();
    store.add_fact("fresh fact", "docs").await.unwrap();

    let removed = store.delete(MemoryTier::Semantic, 1).await.unwrap();
    assert_eq!(removed.map(|r| r.content), Some("stale fact".to_string()));
    assert!(store.delete(MemoryTier::Semantic, 1).await.unwrap().is_none());

    let reloaded = MemoryStore::load(store.path()).await.unwrap();
    let remaining = reloaded.list(MemoryTier::Semantic).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, 2);
    assert!(reloaded.get(MemoryTier::Semantic, 2).await.is_some());
}
