//! Physical index schema.
//!
//! Every document carries a fixed set of top-level attributes plus a
//! `fields` object holding one array per populated (field, value kind)
//! pair:
//!
//! | Attribute      | Content                                            |
//! |----------------|----------------------------------------------------|
//! | `objectID`     | `{contentId}.{culture}`                            |
//! | `objectType`   | Object type tag                                    |
//! | `key`          | Content id                                         |
//! | `culture`      | Lowercase culture code or `inv`                    |
//! | `segment`      | Segment, always `def` for persisted documents      |
//! | `accessKeys`   | Access grant ids, or the nil id when unprotected   |
//! | `pathKeys`     | Ancestor-or-self content ids                       |
//! | `allTexts*`    | Aggregate text buckets, one per relevance tier     |
//! | `fields.*`     | `{name}{postfix}` value arrays                     |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Culture sentinel for invariant documents.
pub const INVARIANT_CULTURE: &str = "inv";

/// Segment sentinel for the default segment.
pub const DEFAULT_SEGMENT: &str = "def";

/// Logical field carrying ancestor-or-self content ids on the write path.
pub const PATH_IDS_FIELD: &str = "__pathIds";

/// Logical field carrying the content type id.
pub const CONTENT_TYPE_ID_FIELD: &str = "contentTypeId";

/// Prefix for keyword fields holding pre-bucketed range values.
pub const RANGE_FIELD_PREFIX: &str = "__range_";

/// Fixed top-level attribute names.
pub mod attributes {
    /// Document id.
    pub const ID: &str = "objectID";
    /// Object type tag.
    pub const OBJECT_TYPE: &str = "objectType";
    /// Content key.
    pub const KEY: &str = "key";
    /// Culture code.
    pub const CULTURE: &str = "culture";
    /// Segment.
    pub const SEGMENT: &str = "segment";
    /// Access grant keys.
    pub const ACCESS_KEYS: &str = "accessKeys";
    /// Path-ancestor keys.
    pub const PATH_KEYS: &str = "pathKeys";
    /// Aggregate text, base tier.
    pub const ALL_TEXTS: &str = "allTexts";
    /// Aggregate text, highest relevance tier.
    pub const ALL_TEXTS_R1: &str = "allTextsR1";
    /// Aggregate text, second relevance tier.
    pub const ALL_TEXTS_R2: &str = "allTextsR2";
    /// Aggregate text, third relevance tier.
    pub const ALL_TEXTS_R3: &str = "allTextsR3";
    /// Namespace of the per-field value arrays.
    pub const FIELDS: &str = "fields";
}

// ============================================================================
// ValueKind
// ============================================================================

/// Physical value kind of an encoded attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Full-text values.
    Texts,
    /// Exact-match string values.
    Keywords,
    /// 32-bit integers.
    Integers,
    /// Decimals, matched at two fractional digits.
    Decimals,
    /// Timestamps, stored as epoch seconds.
    DateTimes,
}

impl ValueKind {
    /// All value kinds, in document emission order.
    pub const ALL: [ValueKind; 5] = [
        ValueKind::Texts,
        ValueKind::Keywords,
        ValueKind::Integers,
        ValueKind::Decimals,
        ValueKind::DateTimes,
    ];

    /// Postfix appended to the logical field name.
    pub fn postfix(&self) -> &'static str {
        match self {
            Self::Texts => "_texts",
            Self::Keywords => "_keywords",
            Self::Integers => "_integers",
            Self::Decimals => "_decimals",
            Self::DateTimes => "_datetimeoffsets",
        }
    }

    /// Short name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Texts => "texts",
            Self::Keywords => "keywords",
            Self::Integers => "integers",
            Self::Decimals => "decimals",
            Self::DateTimes => "datetimes",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
