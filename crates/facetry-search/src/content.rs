//! Write-path input model: field tuples, variations, and protection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ObjectType
// ============================================================================

/// Kind of content an indexed document represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// Unrecognized or missing type tag.
    #[default]
    Unknown,
    /// Published document.
    Document,
    /// Media item.
    Media,
    /// Member.
    Member,
    /// Document blueprint.
    DocumentBlueprint,
    /// Element.
    Element,
}

impl ObjectType {
    /// Stored tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Document => "Document",
            Self::Media => "Media",
            Self::Member => "Member",
            Self::DocumentBlueprint => "DocumentBlueprint",
            Self::Element => "Element",
        }
    }

    /// Parse a stored tag, falling back to [`ObjectType::Unknown`].
    pub fn parse_lenient(tag: &str) -> Self {
        tag.parse().unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = facetry_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(Self::Unknown),
            "Document" => Ok(Self::Document),
            "Media" => Ok(Self::Media),
            "Member" => Ok(Self::Member),
            "DocumentBlueprint" => Ok(Self::DocumentBlueprint),
            "Element" => Ok(Self::Element),
            other => Err(facetry_core::Error::unsupported(format!(
                "object type '{other}'"
            ))),
        }
    }
}

// ============================================================================
// IndexValue
// ============================================================================

/// Values of one field tuple, split by kind and text relevance tier.
///
/// `texts_r1` is the most relevant tier, `texts` the base tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexValue {
    /// Exact-match values.
    pub keywords: Vec<String>,
    /// Base-tier text.
    pub texts: Vec<String>,
    /// Highest relevance tier.
    pub texts_r1: Vec<String>,
    /// Second relevance tier.
    pub texts_r2: Vec<String>,
    /// Third relevance tier.
    pub texts_r3: Vec<String>,
    /// Integers.
    pub integers: Vec<i32>,
    /// Decimals.
    pub decimals: Vec<f64>,
    /// Timestamps.
    pub date_times: Vec<DateTime<Utc>>,
}

impl IndexValue {
    /// Empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set keyword values.
    pub fn keywords<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set base-tier text values.
    pub fn texts<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.texts = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set text values of relevance tier 1, 2, or 3.
    ///
    /// Any other tier number sets the base tier.
    pub fn texts_tier<I, S>(mut self, tier: u8, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        match tier {
            1 => self.texts_r1 = values,
            2 => self.texts_r2 = values,
            3 => self.texts_r3 = values,
            _ => self.texts = values,
        }
        self
    }

    /// Set integer values.
    pub fn integers(mut self, values: impl Into<Vec<i32>>) -> Self {
        self.integers = values.into();
        self
    }

    /// Set decimal values.
    pub fn decimals(mut self, values: impl Into<Vec<f64>>) -> Self {
        self.decimals = values.into();
        self
    }

    /// Set timestamp values.
    pub fn date_times(mut self, values: impl Into<Vec<DateTime<Utc>>>) -> Self {
        self.date_times = values.into();
        self
    }

    /// Whether no kind holds any value.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.texts.is_empty()
            && self.texts_r1.is_empty()
            && self.texts_r2.is_empty()
            && self.texts_r3.is_empty()
            && self.integers.is_empty()
            && self.decimals.is_empty()
            && self.date_times.is_empty()
    }
}

// ============================================================================
// IndexField / Variation / ContentProtection
// ============================================================================

/// A field tuple: values of one logical field for one culture/segment
/// combination. `None` means invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexField {
    /// Logical field name.
    pub field_name: String,
    /// Values.
    pub value: IndexValue,
    /// Culture, or `None` for culture-invariant values.
    #[serde(default)]
    pub culture: Option<String>,
    /// Segment, or `None` for segment-invariant values.
    #[serde(default)]
    pub segment: Option<String>,
}

impl IndexField {
    /// Invariant field tuple.
    pub fn invariant(field_name: impl Into<String>, value: IndexValue) -> Self {
        Self {
            field_name: field_name.into(),
            value,
            culture: None,
            segment: None,
        }
    }

    /// Field tuple for a culture/segment combination.
    pub fn variant(
        field_name: impl Into<String>,
        value: IndexValue,
        culture: Option<&str>,
        segment: Option<&str>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            value,
            culture: culture.map(str::to_string),
            segment: segment.map(str::to_string),
        }
    }
}

/// A culture/segment combination a content item exists in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variation {
    /// Culture, or `None` for invariant content.
    #[serde(default)]
    pub culture: Option<String>,
    /// Segment, or `None` for the default segment.
    #[serde(default)]
    pub segment: Option<String>,
}

impl Variation {
    /// The single variation of invariant content.
    pub fn invariant() -> Self {
        Self::default()
    }

    /// Default-segment variation of a culture.
    pub fn culture(culture: impl Into<String>) -> Self {
        Self {
            culture: Some(culture.into()),
            segment: None,
        }
    }

    /// Variation with both culture and segment.
    pub fn new(culture: Option<&str>, segment: Option<&str>) -> Self {
        Self {
            culture: culture.map(str::to_string),
            segment: segment.map(str::to_string),
        }
    }
}

/// Access grants protecting a content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentProtection {
    /// Ids of the principals and groups granted access.
    pub access_ids: Vec<Uuid>,
}

impl ContentProtection {
    /// Protection granting the given ids.
    pub fn new(access_ids: impl Into<Vec<Uuid>>) -> Self {
        Self {
            access_ids: access_ids.into(),
        }
    }
}
