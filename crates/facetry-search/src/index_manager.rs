//! Index creation.

use std::sync::Arc;

use facetry_core::{ProviderConfig, ServerRoleAccessor};

use crate::backend::{IndexSettings, SearchBackend};
use crate::indexer::IndexListingCache;

/// Creates indexes with the settings search and indexing depend on.
pub struct IndexManager {
    backend: Arc<dyn SearchBackend>,
    roles: Arc<dyn ServerRoleAccessor>,
    facetable_fields: Vec<String>,
    indices: Option<Arc<IndexListingCache>>,
}

impl IndexManager {
    /// Create a manager using the configured role and facetable attributes.
    pub fn new(backend: Arc<dyn SearchBackend>, config: &ProviderConfig) -> Self {
        Self {
            backend,
            roles: Arc::new(config.server_role),
            facetable_fields: config.facetable_fields.clone(),
            indices: None,
        }
    }

    /// Invalidate this listing cache whenever an index is created.
    pub fn with_metadata_cache(mut self, indices: Arc<IndexListingCache>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Replace the role source.
    pub fn with_role_accessor(mut self, roles: Arc<dyn ServerRoleAccessor>) -> Self {
        self.roles = roles;
        self
    }

    /// Create the index if it does not exist. Existing indexes are left
    /// untouched; failures are logged.
    pub async fn ensure(&self, index_alias: &str) {
        let role = self.roles.current_role();
        if !role.can_mutate_indexes() {
            log::debug!("Skipping ensure of '{index_alias}': role '{role}' does not mutate indexes");
            return;
        }

        match self.backend.index_exists(index_alias).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                log::error!("Unable to check whether '{index_alias}' exists: {e}");
                return;
            }
        }

        log::info!("Creating index '{index_alias}'...");
        let settings = IndexSettings::with_defaults(&self.facetable_fields);
        match self.backend.set_settings(index_alias, &settings).await {
            Ok(()) => {
                log::info!("Index '{index_alias}' has been created");
                if let Some(indices) = &self.indices {
                    indices.invalidate(&self.backend.name().to_string());
                }
            }
            Err(e) => log::error!("Index '{index_alias}' could not be created: {e}"),
        }
    }
}
