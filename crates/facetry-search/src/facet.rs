//! Typed facet requests.
//!
//! Range facets are part of the model but the engine cannot compute them;
//! the planner drops them with a warning. Pre-bucket ranges into a keyword
//! field (see [`crate::range_field`]) and facet on that instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ValueKind;

/// A named bucket of a range facet. Bounds follow [`crate::filter::FilterRange`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRange<T> {
    /// Bucket key reported back to callers.
    pub key: String,
    /// Inclusive lower bound.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    /// Exclusive upper bound.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

/// A typed facet on one logical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Facet {
    /// Distinct keyword values.
    Keyword {
        /// Logical field name
        field_name: String,
    },
    /// Distinct integer values.
    IntegerExact {
        /// Logical field name
        field_name: String,
    },
    /// Integer buckets (not supported by the engine).
    IntegerRange {
        /// Logical field name
        field_name: String,
        /// Buckets
        ranges: Vec<FacetRange<i32>>,
    },
    /// Distinct decimal values.
    DecimalExact {
        /// Logical field name
        field_name: String,
    },
    /// Decimal buckets (not supported by the engine).
    DecimalRange {
        /// Logical field name
        field_name: String,
        /// Buckets
        ranges: Vec<FacetRange<f64>>,
    },
    /// Distinct timestamps.
    DateTimeExact {
        /// Logical field name
        field_name: String,
    },
    /// Timestamp buckets (not supported by the engine).
    DateTimeRange {
        /// Logical field name
        field_name: String,
        /// Buckets
        ranges: Vec<FacetRange<DateTime<Utc>>>,
    },
}

impl Facet {
    /// Keyword facet.
    pub fn keyword(field_name: impl Into<String>) -> Self {
        Self::Keyword {
            field_name: field_name.into(),
        }
    }

    /// Exact integer facet.
    pub fn integer_exact(field_name: impl Into<String>) -> Self {
        Self::IntegerExact {
            field_name: field_name.into(),
        }
    }

    /// Exact decimal facet.
    pub fn decimal_exact(field_name: impl Into<String>) -> Self {
        Self::DecimalExact {
            field_name: field_name.into(),
        }
    }

    /// Exact timestamp facet.
    pub fn date_time_exact(field_name: impl Into<String>) -> Self {
        Self::DateTimeExact {
            field_name: field_name.into(),
        }
    }

    /// Logical field name.
    pub fn field_name(&self) -> &str {
        match self {
            Self::Keyword { field_name }
            | Self::IntegerExact { field_name }
            | Self::IntegerRange { field_name, .. }
            | Self::DecimalExact { field_name }
            | Self::DecimalRange { field_name, .. }
            | Self::DateTimeExact { field_name }
            | Self::DateTimeRange { field_name, .. } => field_name,
        }
    }

    /// Whether this is a range facet.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Self::IntegerRange { .. } | Self::DecimalRange { .. } | Self::DateTimeRange { .. }
        )
    }

    /// Physical value kind the facet reads.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Keyword { .. } => ValueKind::Keywords,
            Self::IntegerExact { .. } | Self::IntegerRange { .. } => ValueKind::Integers,
            Self::DecimalExact { .. } | Self::DecimalRange { .. } => ValueKind::Decimals,
            Self::DateTimeExact { .. } | Self::DateTimeRange { .. } => ValueKind::DateTimes,
        }
    }

    /// Variant tag for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Keyword { .. } => "keyword",
            Self::IntegerExact { .. } => "integer_exact",
            Self::IntegerRange { .. } => "integer_range",
            Self::DecimalExact { .. } => "decimal_exact",
            Self::DecimalRange { .. } => "decimal_range",
            Self::DateTimeExact { .. } => "date_time_exact",
            Self::DateTimeRange { .. } => "date_time_range",
        }
    }
}
