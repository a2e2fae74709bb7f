//! Integration tests for the write path: cascading deletes, resets, roles,
//! and index metadata.

use std::sync::Arc;
use std::time::Duration;

use facetry_core::{ProviderConfig, ServerRole};
use facetry_search::{
    HealthStatus, IndexField, IndexMetadata, IndexValue, Indexer, MemoryBackend, Variation,
};
use uuid::Uuid;

use crate::common::{TestHarness, sorted_ids};

/// Root, child, and grandchild of tree `tree`.
fn tree_ids(tree: u128) -> [Uuid; 3] {
    [
        Uuid::from_u128(tree * 100),
        Uuid::from_u128(tree * 100 + 1),
        Uuid::from_u128(tree * 100 + 2),
    ]
}

fn title(text: &str) -> Vec<IndexField> {
    vec![IndexField::invariant("title", IndexValue::new().texts([text]))]
}

/// Three trees of three generations each.
async fn seed_trees(harness: &TestHarness) {
    for tree in 1..=3 {
        let [root, child, grandchild] = tree_ids(tree);
        harness
            .index_item(root, &[root], &[Variation::invariant()], title("tree"))
            .await;
        harness
            .index_item(child, &[root, child], &[Variation::invariant()], title("tree"))
            .await;
        harness
            .index_item(
                grandchild,
                &[root, child, grandchild],
                &[Variation::invariant()],
                title("tree"),
            )
            .await;
    }
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_cascades_to_descendants() {
    let harness = TestHarness::new("indexer_tests");
    seed_trees(&harness).await;
    assert_eq!(harness.search(harness.request().query("tree")).await.total, 9);

    let [first, _, _] = tree_ids(1);
    let [second, _, _] = tree_ids(2);
    harness.indexer.delete(&harness.index, &[first, second]).await;

    let result = harness.search(harness.request().query("tree")).await;
    assert_eq!(result.total, 3);
    let mut remaining = tree_ids(3).to_vec();
    remaining.sort();
    assert_eq!(sorted_ids(&result), remaining);
}

#[tokio::test]
async fn test_delete_of_a_child_keeps_its_ancestors() {
    let harness = TestHarness::new("indexer_tests");
    seed_trees(&harness).await;

    let [root, child, _] = tree_ids(3);
    harness.indexer.delete(&harness.index, &[child]).await;

    let result = harness.search(harness.request().query("tree")).await;
    assert_eq!(result.total, 7);
    assert!(harness.backend.document(&harness.index, &format!("{root}.inv")).is_some());
    assert!(harness.backend.document(&harness.index, &format!("{child}.inv")).is_none());
}

#[tokio::test]
async fn test_delete_of_unknown_id_changes_nothing() {
    let harness = TestHarness::new("indexer_tests");
    seed_trees(&harness).await;

    harness
        .indexer
        .delete(&harness.index, &[Uuid::from_u128(12345)])
        .await;

    assert_eq!(harness.search(harness.request().query("tree")).await.total, 9);
}

#[tokio::test]
async fn test_delete_removes_every_culture() {
    let harness = TestHarness::new("indexer_tests");
    let id = Uuid::from_u128(7);
    harness
        .index_item(
            id,
            &[id],
            &[Variation::culture("en-US"), Variation::culture("da-DK")],
            title("cultured"),
        )
        .await;
    assert_eq!(harness.backend.object_ids(&harness.index).len(), 2);

    harness.indexer.delete(&harness.index, &[id]).await;

    assert!(harness.backend.object_ids(&harness.index).is_empty());
}

// ============================================================================
// Add / update
// ============================================================================

#[tokio::test]
async fn test_update_replaces_document_values() {
    let harness = TestHarness::new("indexer_tests");
    let id = Uuid::from_u128(1);
    harness
        .index_item(id, &[id], &[Variation::invariant()], title("before"))
        .await;
    harness
        .index_item(id, &[id], &[Variation::invariant()], title("after"))
        .await;

    assert_eq!(harness.search(harness.request().query("before")).await.total, 0);
    assert_eq!(harness.search(harness.request().query("after")).await.total, 1);
    assert_eq!(harness.backend.object_ids(&harness.index).len(), 1);
}

#[tokio::test]
async fn test_stored_document_shape() {
    let harness = TestHarness::new("indexer_tests");
    let [root, child, _] = tree_ids(1);
    harness
        .index_item(
            child,
            &[root, child],
            &[Variation::culture("en-US")],
            vec![IndexField::invariant(
                "tags",
                IndexValue::new().keywords(["a", "b"]).integers([3]),
            )],
        )
        .await;

    let stored = harness
        .backend
        .document(&harness.index, &format!("{child}.en-us"))
        .unwrap();
    assert_eq!(stored["culture"], "en-us");
    assert_eq!(stored["segment"], "def");
    assert_eq!(stored["key"], child.to_string());
    assert_eq!(stored["pathKeys"][0], root.to_string());
    assert_eq!(stored["accessKeys"][0], Uuid::nil().to_string());
    assert_eq!(stored["fields"]["tags_keywords"][1], "b");
    assert_eq!(stored["fields"]["tags_integers"][0], 3);
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn test_reset_keeps_settings() {
    let harness = TestHarness::new("indexer_tests");
    harness.manager.ensure(&harness.index).await;
    seed_trees(&harness).await;

    harness.indexer.reset(&harness.index).await;

    assert!(harness.backend.object_ids(&harness.index).is_empty());
    let settings = harness.backend.settings(&harness.index).unwrap();
    assert!(!settings.searchable_attributes.is_empty());
}

#[tokio::test]
async fn test_reset_of_missing_index_is_a_no_op() {
    let harness = TestHarness::new("indexer_tests");

    harness.indexer.reset(&harness.index).await;

    assert_eq!(harness.backend.mutation_count(), 0);
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_subscriber_never_mutates() {
    let harness = TestHarness::with_role("indexer_tests", ServerRole::Subscriber);

    harness.manager.ensure(&harness.index).await;
    seed_trees(&harness).await;
    harness.indexer.delete(&harness.index, &[Uuid::from_u128(100)]).await;
    harness.indexer.reset(&harness.index).await;

    assert_eq!(harness.backend.mutation_count(), 0);
    assert_eq!(
        harness.indexer.get_metadata(&harness.index).await,
        IndexMetadata::unknown()
    );
}

#[tokio::test]
async fn test_scheduling_publisher_mutates() {
    let harness = TestHarness::with_role("indexer_tests", ServerRole::SchedulingPublisher);

    seed_trees(&harness).await;

    assert_eq!(harness.backend.object_ids(&harness.index).len(), 9);
}

// ============================================================================
// Metadata
// ============================================================================

#[tokio::test]
async fn test_metadata_lifecycle() {
    let harness = TestHarness::new("indexer_tests");
    harness.manager.ensure(&harness.index).await;
    let empty = harness.indexer.get_metadata(&harness.index).await;
    assert_eq!(empty.health_status, HealthStatus::Empty);
    assert_eq!(empty.document_count, 0);

    seed_trees(&harness).await;
    let healthy = harness.indexer.get_metadata(&harness.index).await;
    assert_eq!(healthy.health_status, HealthStatus::Healthy);
    assert_eq!(healthy.document_count, 9);

    harness.indexer.reset(&harness.index).await;
    assert_eq!(
        harness.indexer.get_metadata(&harness.index).await.health_status,
        HealthStatus::Empty
    );
}

#[tokio::test]
async fn test_metadata_reports_index_created_after_first_lookup() {
    let harness = TestHarness::new("indexer_tests");
    assert_eq!(
        harness.indexer.get_metadata(&harness.index).await,
        IndexMetadata::unknown()
    );

    harness.manager.ensure(&harness.index).await;

    let created = harness.indexer.get_metadata(&harness.index).await;
    assert_eq!(created.health_status, HealthStatus::Empty);
    assert_eq!(created.document_count, 0);
}

#[tokio::test]
async fn test_metadata_of_unavailable_engine_is_unknown() {
    let harness = TestHarness::new("indexer_tests");
    seed_trees(&harness).await;
    harness.backend.set_available(false);

    assert_eq!(
        harness.indexer.get_metadata(&harness.index).await,
        IndexMetadata::unknown()
    );
}

#[tokio::test]
async fn test_concurrent_metadata_lookups_share_one_listing() {
    let harness = TestHarness::with_config(
        "indexer_tests",
        MemoryBackend::new().with_latency(Duration::from_millis(50)),
        &ProviderConfig::default(),
    );
    seed_trees(&harness).await;

    let lookups = (0..8).map(|_| harness.indexer.get_metadata(&harness.index));
    let results = futures::future::join_all(lookups).await;

    assert!(results.iter().all(|m| m.document_count == 9));
    assert_eq!(harness.backend.listing_count(), 1);
}

#[tokio::test]
async fn test_slow_listing_reports_unknown_to_waiters() {
    let mut config = ProviderConfig::default();
    config.metadata.wait_timeout_secs = 0;
    let backend = Arc::new(MemoryBackend::new().with_latency(Duration::from_millis(200)));
    let indexer = Arc::new(Indexer::new(backend.clone(), &config));

    let leader = {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move { indexer.get_metadata("slow").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let waiter = indexer.get_metadata("slow").await;

    assert_eq!(waiter, IndexMetadata::unknown());
    assert_eq!(leader.await.unwrap(), IndexMetadata::unknown());
    assert_eq!(backend.listing_count(), 1);
}
