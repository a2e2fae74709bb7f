//! Variant document materializer.
//!
//! Explodes a content item's field tuples into one engine document per
//! default-segment variation.
//!
//! ```text
//!  field tuples ──► group by field ──► resolve per variation ──► merge kinds
//!                                        (fallback precedence)      │
//!                                                                   ▼
//!                              IndexDocument ◄── aggregate text buckets
//! ```
//!
//! Fallback precedence for a variation `(c, s)`:
//!
//! 1. tuples with culture `c` and segment `s`
//! 2. tuples with culture `c` and no segment
//! 3. tuples with no culture and segment `s`
//! 4. invariant tuples
//!
//! All applicable tuples contribute; precedence decides the order of the
//! merged values. Values are deduplicated per kind, first occurrence wins.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::codec::{self, epoch_seconds};
use crate::content::{ContentProtection, IndexField, IndexValue, ObjectType, Variation};
use crate::document::{FieldValues, IndexDocument};
use crate::schema::{DEFAULT_SEGMENT, ValueKind};

/// Builds engine documents for a content item.
pub trait DocumentBuilder: Send + Sync {
    /// Build one document per persisted variation. Path keys are left empty
    /// for the caller to fill.
    fn build(
        &self,
        id: Uuid,
        object_type: ObjectType,
        variations: &[Variation],
        fields: &[IndexField],
        protection: Option<&ContentProtection>,
    ) -> Vec<IndexDocument>;
}

/// Default [`DocumentBuilder`] implementing culture/segment fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantDocumentBuilder;

impl VariantDocumentBuilder {
    /// Create a builder.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBuilder for VariantDocumentBuilder {
    fn build(
        &self,
        id: Uuid,
        object_type: ObjectType,
        variations: &[Variation],
        fields: &[IndexField],
        protection: Option<&ContentProtection>,
    ) -> Vec<IndexDocument> {
        let groups = group_by_field(fields);
        let access_keys = access_keys(protection);

        let mut documents: Vec<IndexDocument> = Vec::new();
        for variation in variations.iter().filter(|v| is_default_segment(v)) {
            let culture = codec::index_culture(variation.culture.as_deref());
            let object_id = format!("{id}.{culture}");
            if documents.iter().any(|d| d.object_id == object_id) {
                log::debug!("Skipping duplicate variation for document {object_id}");
                continue;
            }

            let resolved: Vec<(&str, IndexValue)> = groups
                .iter()
                .filter_map(|(name, tuples)| {
                    resolve_field(variation, tuples).map(|value| (*name, value))
                })
                .collect();

            let mut document = IndexDocument {
                object_id,
                object_type: object_type.to_string(),
                key: id,
                culture,
                segment: DEFAULT_SEGMENT.to_string(),
                access_keys: access_keys.clone(),
                path_keys: Vec::new(),
                all_texts: Vec::new(),
                all_texts_r1: Vec::new(),
                all_texts_r2: Vec::new(),
                all_texts_r3: Vec::new(),
                fields: BTreeMap::new(),
            };

            for (name, value) in &resolved {
                extend_unique(&mut document.all_texts, &value.texts);
                extend_unique(&mut document.all_texts_r1, &value.texts_r1);
                extend_unique(&mut document.all_texts_r2, &value.texts_r2);
                extend_unique(&mut document.all_texts_r3, &value.texts_r3);
                insert_field_values(&mut document.fields, name, value);
            }

            documents.push(document);
        }
        documents
    }
}

// ============================================================================
// Resolution
// ============================================================================

fn is_default_segment(variation: &Variation) -> bool {
    variation
        .segment
        .as_deref()
        .is_none_or(|s| s.trim().is_empty())
}

fn group_by_field(fields: &[IndexField]) -> Vec<(&str, Vec<&IndexField>)> {
    let mut groups: Vec<(&str, Vec<&IndexField>)> = Vec::new();
    for field in fields {
        match groups.iter_mut().find(|(name, _)| *name == field.field_name) {
            Some((_, tuples)) => tuples.push(field),
            None => groups.push((field.field_name.as_str(), vec![field])),
        }
    }
    groups
}

fn same(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Precedence rank of a tuple for a variation; `None` when not applicable.
fn precedence(variation: &Variation, field: &IndexField) -> Option<u8> {
    let (v_culture, v_segment) = (variation.culture.as_deref(), variation.segment.as_deref());
    let (f_culture, f_segment) = (field.culture.as_deref(), field.segment.as_deref());

    if v_culture.is_some() && v_segment.is_some() && same(f_culture, v_culture) && same(f_segment, v_segment)
    {
        Some(0)
    } else if v_culture.is_some() && same(f_culture, v_culture) && f_segment.is_none() {
        Some(1)
    } else if v_segment.is_some() && f_culture.is_none() && same(f_segment, v_segment) {
        Some(2)
    } else if f_culture.is_none() && f_segment.is_none() {
        Some(3)
    } else {
        None
    }
}

/// Merge the applicable tuples of one field, or `None` if none apply.
fn resolve_field(variation: &Variation, tuples: &[&IndexField]) -> Option<IndexValue> {
    let mut applicable: Vec<(u8, &IndexField)> = tuples
        .iter()
        .filter_map(|f| precedence(variation, f).map(|rank| (rank, *f)))
        .collect();
    if applicable.is_empty() {
        return None;
    }
    applicable.sort_by_key(|(rank, _)| *rank);

    let mut merged = IndexValue::default();
    for (_, field) in applicable {
        let value = &field.value;
        extend_unique(&mut merged.keywords, &value.keywords);
        extend_unique(&mut merged.texts, &value.texts);
        extend_unique(&mut merged.texts_r1, &value.texts_r1);
        extend_unique(&mut merged.texts_r2, &value.texts_r2);
        extend_unique(&mut merged.texts_r3, &value.texts_r3);
        extend_unique(&mut merged.integers, &value.integers);
        extend_unique(&mut merged.decimals, &value.decimals);
        extend_unique(&mut merged.date_times, &value.date_times);
    }
    Some(merged)
}

fn extend_unique<T: PartialEq + Clone>(target: &mut Vec<T>, values: &[T]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

fn insert_field_values(fields: &mut BTreeMap<String, FieldValues>, name: &str, value: &IndexValue) {
    // Tier separation only survives in the aggregate buckets.
    let mut texts = Vec::new();
    extend_unique(&mut texts, &value.texts_r1);
    extend_unique(&mut texts, &value.texts_r2);
    extend_unique(&mut texts, &value.texts_r3);
    extend_unique(&mut texts, &value.texts);

    let entries = [
        (ValueKind::Texts, FieldValues::Strings(texts)),
        (
            ValueKind::Integers,
            FieldValues::Integers(value.integers.iter().map(|v| i64::from(*v)).collect()),
        ),
        (ValueKind::Decimals, FieldValues::Decimals(value.decimals.clone())),
        (
            ValueKind::DateTimes,
            FieldValues::Integers(value.date_times.iter().map(epoch_seconds).collect()),
        ),
        (ValueKind::Keywords, FieldValues::Strings(value.keywords.clone())),
    ];
    for (kind, values) in entries {
        if !values.is_empty() {
            fields.insert(codec::field_key(name, kind), values);
        }
    }
}

fn access_keys(protection: Option<&ContentProtection>) -> Vec<Uuid> {
    let granted: Vec<Uuid> = protection
        .map(|p| p.access_ids.iter().copied().filter(|id| !id.is_nil()).collect())
        .unwrap_or_default();
    if granted.is_empty() {
        vec![Uuid::nil()]
    } else {
        granted
    }
}
