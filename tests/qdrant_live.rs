// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests against a running Qdrant instance.
//!
//! Ignored by default; run with `cargo test -- --ignored` after starting
//! Qdrant locally (e.g. `docker run -p 6334:6334 qdrant/qdrant`). The
//! endpoint can be overridden with QDRANT_HOST / QDRANT_PORT.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use csvec::store::{StoreError, VectorRecord, VectorStore};

fn endpoint() -> String {
    let host = std::env::var("QDRANT_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port: u16 = std::env::var("QDRANT_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(6334);
    format!("http://{host}:{port}")
}

fn test_store(collection: &str, vector_size: u64) -> VectorStore {
    VectorStore::connect(endpoint(), collection, vector_size).expect("client")
}

fn unique_collection(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .subsec_nanos();
    format!("{prefix}-{}-{nanos}", std::process::id())
}

fn record(id: u64, vector: Vec<f32>, category: &str) -> VectorRecord {
    let serde_json::Value::Object(payload) = json!({ "category": category, "row": id }) else {
        unreachable!()
    };
    VectorRecord {
        id,
        vector,
        payload,
    }
}

async fn drop_collection(store: &VectorStore) {
    let client = qdrant_client::Qdrant::from_url(&endpoint())
        .build()
        .expect("client");
    let _ = client.delete_collection(store.collection_name()).await;
}

#[tokio::test]
#[ignore = "needs a running qdrant"]
async fn ensure_collection_reuses_existing_data() {
    let name = unique_collection("csvec-reuse");
    let store = test_store(&name, 4);

    assert!(store.ensure_collection().await.expect("first ensure"));
    store
        .upsert_points(vec![
            record(0, vec![1.0, 0.0, 0.0, 0.0], "a"),
            record(1, vec![0.0, 1.0, 0.0, 0.0], "b"),
        ])
        .await
        .expect("upsert");

    // The second ensure must keep the points instead of rebuilding.
    assert!(!store.ensure_collection().await.expect("second ensure"));
    let status = store.collection_status().await.expect("status");
    assert_eq!(status.points_count, 2);
    assert_eq!(status.vector_size, 4);
    assert_eq!(status.distance, "Cosine");

    drop_collection(&store).await;
}

#[tokio::test]
#[ignore = "needs a running qdrant"]
async fn mismatched_shape_fails_instead_of_replacing() {
    let name = unique_collection("csvec-mismatch");
    let store = test_store(&name, 4);
    store.ensure_collection().await.expect("create");
    store
        .upsert_points(vec![record(7, vec![0.5, 0.5, 0.5, 0.5], "keep")])
        .await
        .expect("upsert");

    let wrong = test_store(&name, 8);
    let err = wrong.ensure_collection().await.expect_err("must refuse");
    assert!(matches!(err, StoreError::CollectionMismatch { .. }));

    // The original data survived the failed attempt.
    let status = store.collection_status().await.expect("status");
    assert_eq!(status.points_count, 1);

    drop_collection(&store).await;
}

#[tokio::test]
#[ignore = "needs a running qdrant"]
async fn recreate_collection_drops_points() {
    let name = unique_collection("csvec-recreate");
    let store = test_store(&name, 4);
    store.ensure_collection().await.expect("create");
    store
        .upsert_points(vec![record(0, vec![1.0, 0.0, 0.0, 0.0], "old")])
        .await
        .expect("upsert");

    store.recreate_collection().await.expect("recreate");
    let status = store.collection_status().await.expect("status");
    assert_eq!(status.points_count, 0);

    drop_collection(&store).await;
}

#[tokio::test]
#[ignore = "needs a running qdrant"]
async fn search_orders_hits_and_honors_filters() {
    let name = unique_collection("csvec-search");
    let store = test_store(&name, 4);
    store.ensure_collection().await.expect("create");
    store
        .upsert_points(vec![
            record(0, vec![1.0, 0.0, 0.0, 0.0], "news"),
            record(1, vec![0.9, 0.1, 0.0, 0.0], "news"),
            record(2, vec![0.0, 0.0, 1.0, 0.0], "blog"),
        ])
        .await
        .expect("upsert");

    let hits = store
        .search_vectors(vec![1.0, 0.0, 0.0, 0.0], 2, None)
        .await
        .expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "0");
    assert!(hits[0].score >= hits[1].score);
    assert_eq!(hits[0].payload.get("category"), Some(&json!("news")));

    let filtered = store
        .search_vectors(
            vec![1.0, 0.0, 0.0, 0.0],
            5,
            csvec::store::keyword_filter(vec![("category", "blog")]),
        )
        .await
        .expect("filtered search");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, "2");

    drop_collection(&store).await;
}
