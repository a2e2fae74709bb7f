//! Search results and index metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::ObjectType;

/// A matched content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    /// Content id.
    pub id: Uuid,
    /// Object type.
    pub object_type: ObjectType,
}

/// One value of a facet and the number of matching documents carrying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FacetValue {
    /// Keyword value.
    Keyword {
        /// Value
        key: String,
        /// Document count
        count: u64,
    },
    /// Integer value.
    IntegerExact {
        /// Value
        key: i32,
        /// Document count
        count: u64,
    },
    /// Decimal value.
    DecimalExact {
        /// Value
        key: f64,
        /// Document count
        count: u64,
    },
    /// Timestamp value.
    DateTimeExact {
        /// Value
        key: DateTime<Utc>,
        /// Document count
        count: u64,
    },
}

impl FacetValue {
    /// Document count.
    pub fn count(&self) -> u64 {
        match self {
            Self::Keyword { count, .. }
            | Self::IntegerExact { count, .. }
            | Self::DecimalExact { count, .. }
            | Self::DateTimeExact { count, .. } => *count,
        }
    }

    /// Keyword key, if this is a keyword value.
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Integer key, if this is an integer value.
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::IntegerExact { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Decimal key, if this is a decimal value.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::DecimalExact { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Timestamp key, if this is a timestamp value.
    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTimeExact { key, .. } => Some(*key),
            _ => None,
        }
    }
}

/// Value counts of one requested facet. Values carry no ordering guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
    /// Logical field name.
    pub field_name: String,
    /// Values and counts.
    pub values: Vec<FacetValue>,
}

impl FacetResult {
    /// Count for a keyword value, if present.
    pub fn keyword_count(&self, key: &str) -> Option<u64> {
        self.values
            .iter()
            .find(|v| v.as_keyword() == Some(key))
            .map(FacetValue::count)
    }

    /// Count for an integer value, if present.
    pub fn integer_count(&self, key: i32) -> Option<u64> {
        self.values
            .iter()
            .find(|v| v.as_integer() == Some(key))
            .map(FacetValue::count)
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of matching documents across all pages.
    pub total: u64,
    /// Documents of the requested page.
    pub documents: Vec<Document>,
    /// Facet results, one per answerable requested facet.
    pub facets: Vec<FacetResult>,
}

impl SearchResult {
    /// Result with no matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Facet result for a field, if present.
    pub fn facet(&self, field_name: &str) -> Option<&FacetResult> {
        self.facets.iter().find(|f| f.field_name == field_name)
    }
}

/// Health of an index as reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Index exists and holds documents.
    Healthy,
    /// Index exists and holds no documents.
    Empty,
    /// Index has pending engine tasks.
    Rebuilding,
    /// Index is missing or its state could not be determined.
    #[default]
    Unknown,
}

/// Document count and health of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Number of documents.
    pub document_count: u64,
    /// Health.
    pub health_status: HealthStatus,
}

impl IndexMetadata {
    /// Metadata for an index whose state is unknown.
    pub fn unknown() -> Self {
        Self::default()
    }
}
