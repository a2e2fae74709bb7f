//! Typed search filters.
//!
//! A request carries a flat list of filters that are ANDed together. Values
//! within one filter are ORed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ValueKind;

/// Range bounds. The lower bound is inclusive, the upper bound exclusive,
/// and an absent bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterRange<T> {
    /// Inclusive lower bound.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    /// Exclusive upper bound.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

impl<T> FilterRange<T> {
    /// Range with both bounds optional.
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    /// `[min, ∞)`.
    pub fn at_least(min: T) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// `(-∞, max)`.
    pub fn below(max: T) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// `[min, max)`.
    pub fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// A typed filter on one logical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Exact keyword match.
    Keyword {
        /// Logical field name
        field_name: String,
        /// Accepted values
        values: Vec<String>,
        /// Negation flag (unsupported by the engine)
        #[serde(default)]
        negate: bool,
    },
    /// Text match.
    Text {
        /// Logical field name
        field_name: String,
        /// Accepted values
        values: Vec<String>,
        /// Negation flag (unsupported by the engine)
        #[serde(default)]
        negate: bool,
    },
    /// Exact integer match.
    IntegerExact {
        /// Logical field name
        field_name: String,
        /// Accepted values
        values: Vec<i32>,
        /// Negation flag (unsupported by the engine)
        #[serde(default)]
        negate: bool,
    },
    /// Integer ranges.
    IntegerRange {
        /// Logical field name
        field_name: String,
        /// Accepted ranges
        ranges: Vec<FilterRange<i32>>,
        /// Negation flag (unsupported by the engine)
        #[serde(default)]
        negate: bool,
    },
    /// Exact decimal match at two fractional digits.
    DecimalExact {
        /// Logical field name
        field_name: String,
        /// Accepted values
        values: Vec<f64>,
        /// Negation flag (unsupported by the engine)
        #[serde(default)]
        negate: bool,
    },
    /// Decimal ranges.
    DecimalRange {
        /// Logical field name
        field_name: String,
        /// Accepted ranges
        ranges: Vec<FilterRange<f64>>,
        /// Negation flag (unsupported by the engine)
        #[serde(default)]
        negate: bool,
    },
    /// Exact timestamp match at second precision.
    DateTimeExact {
        /// Logical field name
        field_name: String,
        /// Accepted values
        values: Vec<DateTime<Utc>>,
        /// Negation flag (unsupported by the engine)
        #[serde(default)]
        negate: bool,
    },
    /// Timestamp ranges.
    DateTimeRange {
        /// Logical field name
        field_name: String,
        /// Accepted ranges
        ranges: Vec<FilterRange<DateTime<Utc>>>,
        /// Negation flag (unsupported by the engine)
        #[serde(default)]
        negate: bool,
    },
}

impl Filter {
    /// Keyword filter.
    pub fn keyword<I, S>(field_name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keyword {
            field_name: field_name.into(),
            values: values.into_iter().map(Into::into).collect(),
            negate: false,
        }
    }

    /// Text filter.
    pub fn text<I, S>(field_name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Text {
            field_name: field_name.into(),
            values: values.into_iter().map(Into::into).collect(),
            negate: false,
        }
    }

    /// Exact integer filter.
    pub fn integer_exact(field_name: impl Into<String>, values: impl Into<Vec<i32>>) -> Self {
        Self::IntegerExact {
            field_name: field_name.into(),
            values: values.into(),
            negate: false,
        }
    }

    /// Integer range filter.
    pub fn integer_range(
        field_name: impl Into<String>,
        ranges: impl Into<Vec<FilterRange<i32>>>,
    ) -> Self {
        Self::IntegerRange {
            field_name: field_name.into(),
            ranges: ranges.into(),
            negate: false,
        }
    }

    /// Exact decimal filter.
    pub fn decimal_exact(field_name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        Self::DecimalExact {
            field_name: field_name.into(),
            values: values.into(),
            negate: false,
        }
    }

    /// Decimal range filter.
    pub fn decimal_range(
        field_name: impl Into<String>,
        ranges: impl Into<Vec<FilterRange<f64>>>,
    ) -> Self {
        Self::DecimalRange {
            field_name: field_name.into(),
            ranges: ranges.into(),
            negate: false,
        }
    }

    /// Exact timestamp filter.
    pub fn date_time_exact(
        field_name: impl Into<String>,
        values: impl Into<Vec<DateTime<Utc>>>,
    ) -> Self {
        Self::DateTimeExact {
            field_name: field_name.into(),
            values: values.into(),
            negate: false,
        }
    }

    /// Timestamp range filter.
    pub fn date_time_range(
        field_name: impl Into<String>,
        ranges: impl Into<Vec<FilterRange<DateTime<Utc>>>>,
    ) -> Self {
        Self::DateTimeRange {
            field_name: field_name.into(),
            ranges: ranges.into(),
            negate: false,
        }
    }

    /// Return this filter with the negation flag set.
    pub fn negated(mut self) -> Self {
        match &mut self {
            Self::Keyword { negate, .. }
            | Self::Text { negate, .. }
            | Self::IntegerExact { negate, .. }
            | Self::IntegerRange { negate, .. }
            | Self::DecimalExact { negate, .. }
            | Self::DecimalRange { negate, .. }
            | Self::DateTimeExact { negate, .. }
            | Self::DateTimeRange { negate, .. } => *negate = true,
        }
        self
    }

    /// Logical field name.
    pub fn field_name(&self) -> &str {
        match self {
            Self::Keyword { field_name, .. }
            | Self::Text { field_name, .. }
            | Self::IntegerExact { field_name, .. }
            | Self::IntegerRange { field_name, .. }
            | Self::DecimalExact { field_name, .. }
            | Self::DecimalRange { field_name, .. }
            | Self::DateTimeExact { field_name, .. }
            | Self::DateTimeRange { field_name, .. } => field_name,
        }
    }

    /// Whether the negation flag is set.
    pub fn is_negated(&self) -> bool {
        match self {
            Self::Keyword { negate, .. }
            | Self::Text { negate, .. }
            | Self::IntegerExact { negate, .. }
            | Self::IntegerRange { negate, .. }
            | Self::DecimalExact { negate, .. }
            | Self::DecimalRange { negate, .. }
            | Self::DateTimeExact { negate, .. }
            | Self::DateTimeRange { negate, .. } => *negate,
        }
    }

    /// Number of values or ranges.
    pub fn value_count(&self) -> usize {
        match self {
            Self::Keyword { values, .. } | Self::Text { values, .. } => values.len(),
            Self::IntegerExact { values, .. } => values.len(),
            Self::IntegerRange { ranges, .. } => ranges.len(),
            Self::DecimalExact { values, .. } => values.len(),
            Self::DecimalRange { ranges, .. } => ranges.len(),
            Self::DateTimeExact { values, .. } => values.len(),
            Self::DateTimeRange { ranges, .. } => ranges.len(),
        }
    }

    /// Whether this filter carries ranges rather than exact values.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Self::IntegerRange { .. } | Self::DecimalRange { .. } | Self::DateTimeRange { .. }
        )
    }

    /// Physical value kind the filter targets.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Keyword { .. } => ValueKind::Keywords,
            Self::Text { .. } => ValueKind::Texts,
            Self::IntegerExact { .. } | Self::IntegerRange { .. } => ValueKind::Integers,
            Self::DecimalExact { .. } | Self::DecimalRange { .. } => ValueKind::Decimals,
            Self::DateTimeExact { .. } | Self::DateTimeRange { .. } => ValueKind::DateTimes,
        }
    }

    /// Variant tag for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Keyword { .. } => "keyword",
            Self::Text { .. } => "text",
            Self::IntegerExact { .. } => "integer_exact",
            Self::IntegerRange { .. } => "integer_range",
            Self::DecimalExact { .. } => "decimal_exact",
            Self::DecimalRange { .. } => "decimal_range",
            Self::DateTimeExact { .. } => "date_time_exact",
            Self::DateTimeRange { .. } => "date_time_range",
        }
    }
}
