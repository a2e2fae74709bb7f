//! Field codec.
//!
//! Pure encoding of logical field names and typed values into the flat
//! attribute names and filter literals the engine understands.
//!
//! | Filter            | Literal                                   |
//! |-------------------|-------------------------------------------|
//! | keyword / text    | `attr:"value"`                            |
//! | integer exact     | `attr:5`                                  |
//! | integer range     | `attr:{min} TO {max - 1}`                 |
//! | decimal exact     | `attr:1.50`                               |
//! | decimal range     | `attr:{min:.2} TO {max - 0.01:.2}`        |
//! | datetime exact    | `attr:{epoch seconds}`                    |
//! | datetime range    | `attr:{min secs} TO {max secs - 1}`       |
//!
//! Engine ranges are inclusive at both ends while filter ranges exclude
//! their upper bound, hence the one-unit adjustment. Open bounds become the
//! type's extreme value.

use chrono::{DateTime, Utc};

use crate::facet::Facet;
use crate::filter::{Filter, FilterRange};
use crate::schema::{DEFAULT_SEGMENT, INVARIANT_CULTURE, ValueKind, attributes};
use crate::sorter::Sorter;

/// Lower bound substituted for an open decimal range. The engine compares
/// decimals as doubles, so this is the nearest `f64` to the decimal minimum.
pub const DECIMAL_MIN: f64 = -79_228_162_514_264_337_593_543_950_335.0;

/// Upper bound substituted for an open decimal range, likewise the nearest
/// `f64` to the decimal maximum.
pub const DECIMAL_MAX: f64 = 79_228_162_514_264_337_593_543_950_335.0;

/// Lower bound substituted for an open timestamp range (the unix epoch).
pub const DATETIME_MIN_EPOCH: i64 = 0;

/// Upper bound substituted for an open timestamp range (9999-12-31T23:59:59Z).
pub const DATETIME_MAX_EPOCH: i64 = 253_402_300_799;

// ============================================================================
// Attribute names
// ============================================================================

/// Key of a field inside the document's `fields` object: `{name}{postfix}`.
pub fn field_key(name: &str, kind: ValueKind) -> String {
    format!("{name}{}", kind.postfix())
}

/// Full attribute path of a field: `fields.{name}{postfix}`.
///
/// Injective over `(name, kind)` since no postfix is a suffix of another.
pub fn field_name(name: &str, kind: ValueKind) -> String {
    format!("{}.{}", attributes::FIELDS, field_key(name, kind))
}

/// Attribute a filter targets.
pub fn filter_attribute(filter: &Filter) -> String {
    field_name(filter.field_name(), filter.value_kind())
}

/// Attribute a facet reads, or `None` for range facets the engine cannot
/// compute.
pub fn facet_attribute(facet: &Facet) -> Option<String> {
    if facet.is_range() {
        return None;
    }
    Some(field_name(facet.field_name(), facet.value_kind()))
}

// ============================================================================
// Literals
// ============================================================================

/// Wrap a value in exact-match quotes.
///
/// Embedded quotes are not escaped; such values are passed through verbatim
/// with a warning.
pub fn quote(value: &str) -> String {
    if value.contains('"') {
        log::warn!("Filter value contains an unescaped quote and may not match: {value}");
    }
    format!("\"{value}\"")
}

/// Decimal formatted at the indexed precision of two fractional digits.
pub fn format_decimal(value: f64) -> String {
    format!("{value:.2}")
}

/// Epoch seconds of a timestamp.
pub fn epoch_seconds(value: &DateTime<Utc>) -> i64 {
    value.timestamp()
}

fn integer_range(attribute: &str, range: &FilterRange<i32>) -> String {
    let min = range.min.unwrap_or(i32::MIN);
    let max = i64::from(range.max.unwrap_or(i32::MAX)) - 1;
    format!("{attribute}:{min} TO {max}")
}

fn decimal_range(attribute: &str, range: &FilterRange<f64>) -> String {
    let min = range.min.unwrap_or(DECIMAL_MIN);
    let max = range.max.unwrap_or(DECIMAL_MAX) - 0.01;
    format!(
        "{attribute}:{} TO {}",
        format_decimal(min),
        format_decimal(max)
    )
}

fn date_time_range(attribute: &str, range: &FilterRange<DateTime<Utc>>) -> String {
    let min = range
        .min
        .as_ref()
        .map(epoch_seconds)
        .unwrap_or(DATETIME_MIN_EPOCH);
    let max = range
        .max
        .as_ref()
        .map(epoch_seconds)
        .unwrap_or(DATETIME_MAX_EPOCH)
        - 1;
    format!("{attribute}:{min} TO {max}")
}

/// One literal per value or range of the filter. The negation flag is not
/// encoded.
pub fn filter_literals(filter: &Filter) -> Vec<String> {
    let attribute = filter_attribute(filter);
    match filter {
        Filter::Keyword { values, .. } | Filter::Text { values, .. } => values
            .iter()
            .map(|v| format!("{attribute}:{}", quote(v)))
            .collect(),
        Filter::IntegerExact { values, .. } => values
            .iter()
            .map(|v| format!("{attribute}:{v}"))
            .collect(),
        Filter::IntegerRange { ranges, .. } => ranges
            .iter()
            .map(|r| integer_range(&attribute, r))
            .collect(),
        Filter::DecimalExact { values, .. } => values
            .iter()
            .map(|v| format!("{attribute}:{}", format_decimal(*v)))
            .collect(),
        Filter::DecimalRange { ranges, .. } => ranges
            .iter()
            .map(|r| decimal_range(&attribute, r))
            .collect(),
        Filter::DateTimeExact { values, .. } => values
            .iter()
            .map(|v| format!("{attribute}:{}", epoch_seconds(v)))
            .collect(),
        Filter::DateTimeRange { ranges, .. } => ranges
            .iter()
            .map(|r| date_time_range(&attribute, r))
            .collect(),
    }
}

/// OR-join literals. A single literal passes through unparenthesized.
pub fn or_group<S: AsRef<str>>(literals: &[S]) -> String {
    match literals {
        [single] => single.as_ref().to_string(),
        _ => {
            let joined: Vec<&str> = literals.iter().map(AsRef::as_ref).collect();
            format!("({})", joined.join(" OR "))
        }
    }
}

/// The filter as one expression: its literals OR-grouped.
pub fn filter_expression(filter: &Filter) -> String {
    or_group(&filter_literals(filter))
}

// ============================================================================
// Variance and replicas
// ============================================================================

/// Stored culture code: lowercase, or the invariant sentinel.
pub fn index_culture(culture: Option<&str>) -> String {
    match culture.map(str::trim).filter(|c| !c.is_empty()) {
        Some(culture) => culture.to_lowercase(),
        None => INVARIANT_CULTURE.to_string(),
    }
}

/// Stored segment: lowercase, or the default-segment sentinel.
pub fn index_segment(segment: Option<&str>) -> String {
    match segment.map(str::trim).filter(|s| !s.is_empty()) {
        Some(segment) => segment.to_lowercase(),
        None => DEFAULT_SEGMENT.to_string(),
    }
}

/// Replica index serving a sorter: `{alias}_{name}{postfix}_{asc|desc}`.
///
/// Relevance sorting uses the primary index and yields `None`.
pub fn replica_index_name(index_alias: &str, sorter: &Sorter) -> Option<String> {
    let (name, kind) = sorter.field()?;
    Some(format!(
        "{index_alias}_{}_{}",
        field_key(name, kind),
        sorter.direction().replica_suffix()
    ))
}
