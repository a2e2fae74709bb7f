//! Search engine backend trait and factory.
//!
//! The [`SearchBackend`] trait is the engine client interface the planner,
//! reconciler, and indexer talk to. It mirrors the engine's REST surface:
//! one multi-query call for reads plus a handful of index operations.
//!
//! # Backends
//!
//! - `AlgoliaBackend`: REST client (requires the `algolia` feature)
//! - [`MemoryBackend`]: in-process engine for tests and local runs
//!
//! # Example
//!
//! ```rust,ignore
//! use facetry_search::{create_search_backend, Searcher, SearchRequest, Facet};
//!
//! let backend = create_search_backend(&config)?;
//! let searcher = Searcher::new(backend);
//! let result = searcher
//!     .search(&SearchRequest::new("books").query("rust").facet(Facet::keyword("tags")))
//!     .await?;
//! println!("Found {} results", result.total);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use facetry_core::{ProviderConfig, Result};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::document::IndexDocument;
use crate::memory::MemoryBackend;
use crate::planner::SubQuery;
use crate::schema::{CONTENT_TYPE_ID_FIELD, ValueKind, attributes};

// ============================================================================
// Wire types
// ============================================================================

/// A hit of the main query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    /// Engine document id.
    #[serde(rename = "objectID", default)]
    pub object_id: String,
    /// Content id.
    #[serde(default)]
    pub key: Option<String>,
    /// Object type tag.
    #[serde(default)]
    pub object_type: Option<String>,
}

/// Facet counts keyed by attribute, then by stringified value.
pub type FacetCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Response to one [`SubQuery`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQueryResponse {
    /// Total matches.
    #[serde(default)]
    pub nb_hits: Option<u64>,
    /// Hits of the requested page.
    #[serde(default)]
    pub hits: Vec<Hit>,
    /// Facet counts.
    #[serde(default)]
    pub facets: Option<FacetCounts>,
}

/// Listing entry for an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    /// Index name.
    pub name: String,
    /// Number of documents.
    #[serde(default)]
    pub entries: u64,
    /// Whether engine tasks are pending on the index.
    #[serde(default)]
    pub pending_task: bool,
}

/// Index configuration applied on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    /// Attributes searched by free-text queries, most relevant first.
    #[serde(default)]
    pub searchable_attributes: Vec<String>,
    /// Attributes usable in facets and facet filters.
    #[serde(default)]
    pub attributes_for_faceting: Vec<String>,
}

impl IndexSettings {
    /// Settings every index is created with, plus extra facetable attributes.
    pub fn with_defaults(extra_facetable: &[String]) -> Self {
        let filter_only = |attribute: &str| format!("filterOnly({attribute})");
        let mut attributes_for_faceting = vec![
            filter_only(attributes::CULTURE),
            filter_only(attributes::SEGMENT),
            filter_only(attributes::PATH_KEYS),
            filter_only(attributes::ACCESS_KEYS),
            filter_only(&codec::field_name(CONTENT_TYPE_ID_FIELD, ValueKind::Keywords)),
        ];
        for attribute in extra_facetable {
            if !attributes_for_faceting.contains(attribute) {
                attributes_for_faceting.push(attribute.clone());
            }
        }
        Self {
            searchable_attributes: vec![
                attributes::ALL_TEXTS_R1.to_string(),
                attributes::ALL_TEXTS_R2.to_string(),
                attributes::ALL_TEXTS_R3.to_string(),
                attributes::ALL_TEXTS.to_string(),
            ],
            attributes_for_faceting,
        }
    }
}

// ============================================================================
// SearchBackend
// ============================================================================

/// Abstract search engine.
///
/// # Async
///
/// All operations are network round trips against a remote engine; the
/// in-memory backend answers immediately.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a batch of queries in one round trip. Responses are in query
    /// order.
    async fn multi_search(&self, queries: &[SubQuery]) -> Result<Vec<SubQueryResponse>>;

    /// Insert or replace documents by `objectID`.
    async fn save_objects(&self, index: &str, documents: &[IndexDocument]) -> Result<()>;

    /// Delete every document matching an AND of OR-groups of facet filters.
    async fn delete_by(&self, index: &str, facet_filters: &[Vec<String>]) -> Result<()>;

    /// Delete all documents, keeping settings.
    async fn clear_objects(&self, index: &str) -> Result<()>;

    /// Whether the index exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// List all indexes with their entry counts.
    async fn list_indices(&self) -> Result<Vec<IndexInfo>>;

    /// Create or reconfigure an index and wait for the change to apply.
    async fn set_settings(&self, index: &str, settings: &IndexSettings) -> Result<()>;

    /// Get the backend name for diagnostics.
    fn name(&self) -> &str;

    /// Check if the backend is ready to handle queries.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Create a search backend based on configuration.
///
/// Selection logic:
/// 1. `algolia` feature enabled and credentials configured → `AlgoliaBackend`
/// 2. Otherwise → [`MemoryBackend`]
///
/// # Errors
///
/// Returns an error if the configured remote backend cannot be initialized.
pub fn create_search_backend(config: &ProviderConfig) -> Result<Arc<dyn SearchBackend>> {
    if config.app_id.trim().is_empty() {
        log::warn!("No app_id configured, using the in-memory search backend");
        return Ok(Arc::new(MemoryBackend::new()));
    }

    #[cfg(feature = "algolia")]
    {
        config.validate()?;
        Ok(Arc::new(crate::algolia::AlgoliaBackend::new(config)?))
    }

    #[cfg(not(feature = "algolia"))]
    {
        log::warn!(
            "app_id '{}' configured but built without the `algolia` feature, using the in-memory search backend",
            config.app_id
        );
        Ok(Arc::new(MemoryBackend::new()))
    }
}
