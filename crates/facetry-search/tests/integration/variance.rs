//! Integration tests for culture and segment variance.

use facetry_search::{Facet, Filter, IndexField, IndexValue, Variation};
use uuid::Uuid;

use crate::common::{TestHarness, sorted_ids};

const FIELD_INVARIANT: &str = "FieldOne";
const FIELD_CULTURE: &str = "FieldTwo";
const FIELD_MIXED: &str = "FieldThree";
const FIELD_SEGMENT: &str = "FieldFour";

fn variant_id(n: u32) -> Uuid {
    Uuid::from_u128(0x2000 + u128::from(n))
}

fn invariant_id(n: u32) -> Uuid {
    Uuid::from_u128(0x3000 + u128::from(n))
}

fn texts<const N: usize>(values: [String; N]) -> IndexValue {
    IndexValue::new().texts(values)
}

/// Ten items in `en-US` and `da-DK`, with a `seg1` segment variant, plus
/// five invariant items.
async fn seeded() -> TestHarness {
    let harness = TestHarness::new("variance_tests");

    for i in 1..=10 {
        let id = variant_id(i);
        let en = Some("en-US");
        let da = Some("da-DK");
        harness
            .index_item(
                id,
                &[id],
                &[
                    Variation::culture("en-US"),
                    Variation::culture("da-DK"),
                    Variation::new(en, Some("seg1")),
                ],
                vec![
                    IndexField::invariant(
                        FIELD_INVARIANT,
                        texts([
                            "invariant".into(),
                            format!("invariant{i}"),
                            "commoninvariant".into(),
                        ])
                        .keywords(["shared"]),
                    ),
                    IndexField::variant(
                        FIELD_CULTURE,
                        texts(["english".into(), format!("english{i}")]),
                        en,
                        None,
                    ),
                    IndexField::variant(
                        FIELD_CULTURE,
                        texts(["danish".into(), format!("danish{i}")]),
                        da,
                        None,
                    ),
                    IndexField::variant(
                        FIELD_MIXED,
                        texts(["mixedinvariant".into(), format!("mixedinvariant{i}")]),
                        None,
                        None,
                    ),
                    IndexField::variant(
                        FIELD_MIXED,
                        texts(["mixedenglish".into(), format!("mixedenglish{i}")]),
                        en,
                        None,
                    ),
                    IndexField::variant(
                        FIELD_MIXED,
                        texts(["mixeddanish".into(), format!("mixeddanish{i}")]),
                        da,
                        None,
                    ),
                    IndexField::variant(
                        FIELD_SEGMENT,
                        texts(["defaultenglish".into(), format!("defaultenglish{i}")]),
                        en,
                        None,
                    ),
                    IndexField::variant(
                        FIELD_SEGMENT,
                        texts(["seg1english".into(), format!("seg1english{i}")]),
                        en,
                        Some("seg1"),
                    ),
                    IndexField::variant(
                        FIELD_SEGMENT,
                        texts(["defaultdanish".into(), format!("defaultdanish{i}")]),
                        da,
                        None,
                    ),
                ],
            )
            .await;
    }

    for i in 1..=5 {
        let id = invariant_id(i);
        harness
            .index_item(
                id,
                &[id],
                &[Variation::invariant()],
                vec![IndexField::invariant(
                    FIELD_INVARIANT,
                    texts(["invariantonly".into(), format!("invariantonly{i}")]).keywords(["shared"]),
                )],
            )
            .await;
    }

    harness
}

fn variant_ids() -> Vec<Uuid> {
    (1..=10).map(variant_id).collect()
}

// ============================================================================
// Cultures
// ============================================================================

#[tokio::test]
async fn test_one_document_per_culture() {
    let harness = seeded().await;
    // 10 items in two cultures plus 5 invariant items
    assert_eq!(harness.backend.object_ids(&harness.index).len(), 25);
}

#[tokio::test]
async fn test_culture_variant_values_are_scoped_to_their_culture() {
    let harness = seeded().await;

    let english = harness
        .search(harness.request().query("english").culture("en-US").page(0, 100))
        .await;
    assert_eq!(sorted_ids(&english), variant_ids());

    let danish_in_english = harness
        .search(harness.request().query("danish").culture("en-US"))
        .await;
    assert_eq!(danish_in_english.total, 0);

    let danish = harness
        .search(harness.request().query("danish").culture("da-DK"))
        .await;
    assert_eq!(danish.total, 10);
}

#[tokio::test]
async fn test_single_document_by_culture_variant_value() {
    let harness = seeded().await;

    let result = harness
        .search(harness.request().query("danish7").culture("da-DK"))
        .await;

    assert_eq!(sorted_ids(&result), vec![variant_id(7)]);
}

#[tokio::test]
async fn test_invariant_values_are_found_in_every_culture() {
    let harness = seeded().await;

    for culture in ["en-US", "da-DK"] {
        let result = harness
            .search(harness.request().query("commoninvariant").culture(culture))
            .await;
        assert_eq!(result.total, 10, "culture {culture}");
    }
}

#[tokio::test]
async fn test_mixed_variance_merges_invariant_and_culture_values() {
    let harness = seeded().await;

    let invariant = harness
        .search(harness.request().query("mixedinvariant3").culture("da-DK"))
        .await;
    assert_eq!(sorted_ids(&invariant), vec![variant_id(3)]);

    let english = harness
        .search(harness.request().query("mixedenglish").culture("en-US"))
        .await;
    assert_eq!(english.total, 10);

    let english_in_danish = harness
        .search(harness.request().query("mixedenglish").culture("da-DK"))
        .await;
    assert_eq!(english_in_danish.total, 0);
}

#[tokio::test]
async fn test_invariant_content_is_found_in_every_culture() {
    let harness = seeded().await;

    let without_culture = harness
        .search(harness.request().query("invariantonly"))
        .await;
    assert_eq!(without_culture.total, 5);

    let in_culture = harness
        .search(harness.request().query("invariantonly").culture("en-US"))
        .await;
    assert_eq!(in_culture.total, 5);
}

#[tokio::test]
async fn test_culture_variant_content_needs_a_culture() {
    let harness = seeded().await;

    let result = harness.search(harness.request().query("commoninvariant")).await;

    assert_eq!(result.total, 0);
}

#[tokio::test]
async fn test_culture_is_case_insensitive() {
    let harness = seeded().await;

    let result = harness
        .search(harness.request().query("english").culture("EN-us"))
        .await;

    assert_eq!(result.total, 10);
}

#[tokio::test]
async fn test_facets_count_documents_of_the_requested_culture() {
    let harness = seeded().await;

    let result = harness
        .search(
            harness
                .request()
                .culture("en-US")
                .filter(Filter::keyword(FIELD_INVARIANT, ["shared"]))
                .facet(Facet::keyword(FIELD_INVARIANT)),
        )
        .await;

    // 10 English documents and 5 invariant ones
    assert_eq!(result.total, 15);
    let facet = result.facet(FIELD_INVARIANT).unwrap();
    assert_eq!(facet.keyword_count("shared"), Some(15));
}

// ============================================================================
// Segments
// ============================================================================

#[tokio::test]
async fn test_default_segment_values_are_searchable() {
    let harness = seeded().await;

    let result = harness
        .search(harness.request().query("defaultenglish").culture("en-US"))
        .await;

    assert_eq!(result.total, 10);
}

#[tokio::test]
async fn test_segment_values_are_not_indexed() {
    let harness = seeded().await;

    let default_segment = harness
        .search(harness.request().query("seg1english").culture("en-US"))
        .await;
    assert_eq!(default_segment.total, 0);

    let segment = harness
        .search(
            harness
                .request()
                .query("seg1english")
                .culture("en-US")
                .segment("seg1"),
        )
        .await;
    assert_eq!(segment.total, 0);
}

#[tokio::test]
async fn test_segment_request_only_matches_that_segment() {
    let harness = seeded().await;

    let result = harness
        .search(
            harness
                .request()
                .query("defaultenglish")
                .culture("en-US")
                .segment("seg1"),
        )
        .await;

    assert_eq!(result.total, 0);
}
