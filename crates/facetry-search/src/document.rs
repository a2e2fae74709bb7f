//! Materialized index documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::ValueKind;

/// Values of one `fields.*` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValues {
    /// Keywords or texts.
    Strings(Vec<String>),
    /// Integers or epoch-second timestamps.
    Integers(Vec<i64>),
    /// Decimals.
    Decimals(Vec<f64>),
}

impl FieldValues {
    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            Self::Strings(v) => v.len(),
            Self::Integers(v) => v.len(),
            Self::Decimals(v) => v.len(),
        }
    }

    /// Whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// String values, if this holds strings.
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::Strings(v) => Some(v),
            _ => None,
        }
    }

    /// Integer values, if this holds integers.
    pub fn as_integers(&self) -> Option<&[i64]> {
        match self {
            Self::Integers(v) => Some(v),
            _ => None,
        }
    }

    /// Decimal values, if this holds decimals.
    pub fn as_decimals(&self) -> Option<&[f64]> {
        match self {
            Self::Decimals(v) => Some(v),
            _ => None,
        }
    }
}

/// One engine document: a content item in one culture.
///
/// Documents are derived and never patched; every write replaces the full
/// document set of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    /// `{contentId}.{culture}`.
    #[serde(rename = "objectID")]
    pub object_id: String,

    /// Object type tag.
    pub object_type: String,

    /// Content id.
    pub key: Uuid,

    /// Lowercase culture code, or the invariant sentinel.
    pub culture: String,

    /// Segment sentinel.
    pub segment: String,

    /// Access grant ids, or the nil id when unprotected.
    pub access_keys: Vec<Uuid>,

    /// Ancestor-or-self content ids.
    #[serde(default)]
    pub path_keys: Vec<String>,

    /// Aggregate base-tier text.
    #[serde(default)]
    pub all_texts: Vec<String>,

    /// Aggregate tier-1 text.
    #[serde(default, rename = "allTextsR1")]
    pub all_texts_r1: Vec<String>,

    /// Aggregate tier-2 text.
    #[serde(default, rename = "allTextsR2")]
    pub all_texts_r2: Vec<String>,

    /// Aggregate tier-3 text.
    #[serde(default, rename = "allTextsR3")]
    pub all_texts_r3: Vec<String>,

    /// Per-field arrays keyed by `{name}{postfix}`.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValues>,
}

impl IndexDocument {
    /// Values of a field of the given kind, if populated.
    pub fn field(&self, name: &str, kind: ValueKind) -> Option<&FieldValues> {
        self.fields.get(&crate::codec::field_key(name, kind))
    }
}
