//! Write path: upserts, cascading deletes, resets, and index metadata.
//!
//! Every mutation is role-guarded and best-effort: engine failures are
//! logged, never returned, so a failed index write cannot break the
//! publishing pipeline that triggered it.

use std::sync::Arc;

use facetry_core::{Error, ProviderConfig, ServerRoleAccessor};
use uuid::Uuid;

use crate::backend::{IndexInfo, SearchBackend};
use crate::cache::SingleFlightCache;
use crate::content::{ContentProtection, IndexField, ObjectType, Variation};
use crate::materializer::{DocumentBuilder, VariantDocumentBuilder};
use crate::result::{HealthStatus, IndexMetadata};
use crate::schema::{PATH_IDS_FIELD, attributes};

/// Index listings cached per backend name.
pub type IndexListingCache = SingleFlightCache<String, Arc<Vec<IndexInfo>>>;

/// Indexes content items into an engine.
pub struct Indexer {
    backend: Arc<dyn SearchBackend>,
    builder: Arc<dyn DocumentBuilder>,
    roles: Arc<dyn ServerRoleAccessor>,
    indices: Arc<IndexListingCache>,
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("backend", &self.backend.name())
            .field("role", &self.roles.current_role())
            .field("indices", &self.indices)
            .finish()
    }
}

impl Indexer {
    /// Create an indexer using the configured role and metadata cache
    /// settings.
    pub fn new(backend: Arc<dyn SearchBackend>, config: &ProviderConfig) -> Self {
        Self {
            backend,
            builder: Arc::new(VariantDocumentBuilder::new()),
            roles: Arc::new(config.server_role),
            indices: Arc::new(SingleFlightCache::new(
                config.metadata.ttl(),
                config.metadata.wait_timeout(),
            )),
        }
    }

    /// The index listing cache behind [`Indexer::get_metadata`]. Share it
    /// with an [`IndexManager`](crate::IndexManager) so created indexes are
    /// reported right away.
    pub fn metadata_cache(&self) -> Arc<IndexListingCache> {
        Arc::clone(&self.indices)
    }

    /// Replace the document builder.
    pub fn with_builder(mut self, builder: Arc<dyn DocumentBuilder>) -> Self {
        self.builder = builder;
        self
    }

    /// Replace the role source.
    pub fn with_role_accessor(mut self, roles: Arc<dyn ServerRoleAccessor>) -> Self {
        self.roles = roles;
        self
    }

    fn may_mutate(&self, operation: &str, index_alias: &str) -> bool {
        let role = self.roles.current_role();
        if role.can_mutate_indexes() {
            return true;
        }
        log::debug!("Skipping {operation} on '{index_alias}': role '{role}' does not mutate indexes");
        false
    }

    fn invalidate_metadata(&self) {
        self.indices.invalidate(&self.backend.name().to_string());
    }

    /// Upsert the documents of a content item, one per culture.
    ///
    /// Documents of cultures the item no longer has are left in place;
    /// delete the item first to drop them.
    ///
    /// The item must carry a `__pathIds` keyword field with its
    /// ancestor-or-self ids; items without one are refused, since their
    /// documents could never be removed by a cascading delete.
    pub async fn add_or_update(
        &self,
        index_alias: &str,
        id: Uuid,
        object_type: ObjectType,
        variations: &[Variation],
        fields: &[IndexField],
        protection: Option<&ContentProtection>,
    ) {
        if !self.may_mutate("add/update", index_alias) {
            return;
        }

        let path_keys: Vec<String> = fields
            .iter()
            .find(|field| field.field_name == PATH_IDS_FIELD)
            .map(|field| field.value.keywords.clone())
            .unwrap_or_default();
        if path_keys.is_empty() {
            log::warn!("Could not index {id} in '{index_alias}': no path ids found");
            return;
        }

        let mut documents = self
            .builder
            .build(id, object_type, variations, fields, protection);
        if documents.is_empty() {
            log::debug!("No default-segment variations of {id} to index in '{index_alias}'");
            return;
        }
        for document in &mut documents {
            document.path_keys = path_keys.clone();
        }

        match self.backend.save_objects(index_alias, &documents).await {
            Ok(()) => log::debug!("Indexed {} documents of {id} in '{index_alias}'", documents.len()),
            Err(e) => log::error!("Unable to add/update documents of {id} in '{index_alias}': {e}"),
        }

        self.invalidate_metadata();
    }

    /// Delete content items and every document whose path contains one of
    /// them.
    pub async fn delete(&self, index_alias: &str, ids: &[Uuid]) {
        if !self.may_mutate("delete", index_alias) {
            return;
        }
        if ids.is_empty() {
            return;
        }

        let group: Vec<String> = ids
            .iter()
            .map(|id| format!("{}:{id}", attributes::PATH_KEYS))
            .collect();
        if let Err(e) = self.backend.delete_by(index_alias, &[group]).await {
            log::error!("Unable to delete documents from '{index_alias}': {e}");
        }

        self.invalidate_metadata();
    }

    /// Remove all documents of an index, keeping its settings.
    pub async fn reset(&self, index_alias: &str) {
        if !self.may_mutate("reset", index_alias) {
            return;
        }

        match self.backend.index_exists(index_alias).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                log::error!("Unable to check whether '{index_alias}' exists: {e}");
                return;
            }
        }

        if let Err(e) = self.backend.clear_objects(index_alias).await {
            log::error!("Unable to clear all documents from '{index_alias}': {e}");
        }

        self.invalidate_metadata();
    }

    /// Document count and health of an index.
    ///
    /// Index listings are cached and concurrent lookups share one engine
    /// call. A lookup that cannot complete in time reports
    /// [`HealthStatus::Unknown`].
    pub async fn get_metadata(&self, index_alias: &str) -> IndexMetadata {
        let backend = Arc::clone(&self.backend);
        let fetched = self
            .indices
            .get_or_fetch(&self.backend.name().to_string(), || async move {
                backend.list_indices().await.map(Arc::new)
            })
            .await;

        let indices = match fetched {
            Ok(indices) => indices,
            Err(e @ Error::Timeout { .. }) => {
                log::warn!("Metadata of '{index_alias}' is unavailable: {e}");
                return IndexMetadata::unknown();
            }
            Err(e) => {
                log::error!("Unable to list indexes for '{index_alias}': {e}");
                return IndexMetadata::unknown();
            }
        };

        let Some(index) = indices.iter().find(|index| index.name == index_alias) else {
            return IndexMetadata::unknown();
        };

        let health_status = if index.pending_task {
            HealthStatus::Rebuilding
        } else if index.entries == 0 {
            HealthStatus::Empty
        } else {
            HealthStatus::Healthy
        };
        IndexMetadata {
            document_count: index.entries,
            health_status,
        }
    }
}
