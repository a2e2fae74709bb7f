//! Pre-bucketed range fields.
//!
//! The engine cannot facet ranges. Indexers that need range facets store
//! the bucket keys a value falls into as keywords of a companion field, and
//! searchers request a keyword facet on that field instead.

use crate::content::{IndexField, IndexValue};
use crate::facet::Facet;
use crate::schema::RANGE_FIELD_PREFIX;

/// Companion field name holding range bucket keys: `__range_{name}`.
pub fn range_field_name(field_name: &str) -> String {
    format!("{RANGE_FIELD_PREFIX}{field_name}")
}

/// Field tuple carrying the bucket keys a value falls into.
pub fn range_field<I, S>(
    field_name: &str,
    bucket_keys: I,
    culture: Option<&str>,
    segment: Option<&str>,
) -> IndexField
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    IndexField::variant(
        range_field_name(field_name),
        IndexValue::new().keywords(bucket_keys),
        culture,
        segment,
    )
}

/// Keyword facet over the companion field of a range facet.
pub fn range_keyword_facet(facet: &Facet) -> Facet {
    Facet::keyword(range_field_name(facet.field_name()))
}
