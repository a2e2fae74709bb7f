//! Typed sorters.

use serde::{Deserialize, Serialize};

use crate::schema::ValueKind;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl Direction {
    /// Suffix used in replica index names.
    pub fn replica_suffix(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// A typed sorter. Only the first sorter of a request is honored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sorter {
    /// Engine relevance.
    Score {
        /// Direction
        #[serde(default)]
        direction: Direction,
    },
    /// Keyword values.
    Keyword {
        /// Logical field name
        field_name: String,
        /// Direction
        #[serde(default)]
        direction: Direction,
    },
    /// Text values.
    Text {
        /// Logical field name
        field_name: String,
        /// Direction
        #[serde(default)]
        direction: Direction,
    },
    /// Integer values.
    Integer {
        /// Logical field name
        field_name: String,
        /// Direction
        #[serde(default)]
        direction: Direction,
    },
    /// Decimal values.
    Decimal {
        /// Logical field name
        field_name: String,
        /// Direction
        #[serde(default)]
        direction: Direction,
    },
    /// Timestamps.
    DateTime {
        /// Logical field name
        field_name: String,
        /// Direction
        #[serde(default)]
        direction: Direction,
    },
}

impl Sorter {
    /// Sort by a field of the given kind.
    pub fn by(field_name: impl Into<String>, kind: ValueKind, direction: Direction) -> Self {
        let field_name = field_name.into();
        match kind {
            ValueKind::Keywords => Self::Keyword {
                field_name,
                direction,
            },
            ValueKind::Texts => Self::Text {
                field_name,
                direction,
            },
            ValueKind::Integers => Self::Integer {
                field_name,
                direction,
            },
            ValueKind::Decimals => Self::Decimal {
                field_name,
                direction,
            },
            ValueKind::DateTimes => Self::DateTime {
                field_name,
                direction,
            },
        }
    }

    /// Sort direction.
    pub fn direction(&self) -> Direction {
        match self {
            Self::Score { direction }
            | Self::Keyword { direction, .. }
            | Self::Text { direction, .. }
            | Self::Integer { direction, .. }
            | Self::Decimal { direction, .. }
            | Self::DateTime { direction, .. } => *direction,
        }
    }

    /// Sorted field and its kind; `None` for relevance sorting.
    pub fn field(&self) -> Option<(&str, ValueKind)> {
        match self {
            Self::Score { .. } => None,
            Self::Keyword { field_name, .. } => Some((field_name, ValueKind::Keywords)),
            Self::Text { field_name, .. } => Some((field_name, ValueKind::Texts)),
            Self::Integer { field_name, .. } => Some((field_name, ValueKind::Integers)),
            Self::Decimal { field_name, .. } => Some((field_name, ValueKind::Decimals)),
            Self::DateTime { field_name, .. } => Some((field_name, ValueKind::DateTimes)),
        }
    }
}
