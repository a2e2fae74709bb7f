//! Provider configuration.
//!
//! [`ProviderConfig`] is read from a TOML file and then overlaid with
//! environment variables:
//!
//! | Variable           | Field     |
//! |--------------------|-----------|
//! | `FACETRY_APP_ID`   | `app_id`  |
//! | `FACETRY_API_KEY`  | `api_key` |
//! | `FACETRY_HOST`     | `host`    |
//!
//! ```toml
//! app_id = "ABC123"
//! server_role = "scheduling_publisher"
//!
//! [metadata]
//! ttl_secs = 300
//! wait_timeout_secs = 10
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::role::ServerRole;

/// Environment variable overriding [`ProviderConfig::app_id`].
pub const ENV_APP_ID: &str = "FACETRY_APP_ID";
/// Environment variable overriding [`ProviderConfig::api_key`].
pub const ENV_API_KEY: &str = "FACETRY_API_KEY";
/// Environment variable overriding [`ProviderConfig::host`].
pub const ENV_HOST: &str = "FACETRY_HOST";

// ============================================================================
// ProviderConfig
// ============================================================================

/// Configuration for a search provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Engine application id.
    #[serde(default)]
    pub app_id: String,

    /// Engine API key. Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Base URL override (defaults to the engine's per-application hosts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum documents per upsert batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Default log filter for binaries.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Role of this process; only index owners mutate indexes.
    #[serde(default)]
    pub server_role: ServerRole,

    /// Metadata cache settings.
    #[serde(default)]
    pub metadata: MetadataCacheConfig,

    /// Extra encoded attributes declared facetable when an index is created.
    #[serde(default)]
    pub facetable_fields: Vec<String>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    1000
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_key: String::new(),
            host: None,
            request_timeout_secs: default_request_timeout_secs(),
            batch_size: default_batch_size(),
            log_level: default_log_level(),
            server_role: ServerRole::default(),
            metadata: MetadataCacheConfig::default(),
            facetable_fields: Vec::new(),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from an optional TOML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        log::debug!(
            "Loaded provider config (app_id='{}', role={})",
            config.app_id,
            config.server_role
        );
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay values from an environment lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(app_id) = lookup(ENV_APP_ID) {
            self.app_id = app_id;
        }
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.api_key = api_key;
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.host = Some(host);
        }
    }

    /// Check the configuration is usable for a remote engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(Error::config(format!(
                "app_id is required (set it in the config file or {ENV_APP_ID})"
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::config(format!(
                "api_key is required (set it in the config file or {ENV_API_KEY})"
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be greater than zero"));
        }
        self.metadata.validate()
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// MetadataCacheConfig
// ============================================================================

/// Time-to-live and wait bound for the index metadata cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataCacheConfig {
    /// How long a fetched index listing stays fresh.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// How long a caller waits on another caller's in-flight fetch before
    /// giving up with an unknown health status.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_wait_timeout_secs() -> u64 {
    10
}

impl Default for MetadataCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

impl MetadataCacheConfig {
    /// Cache time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Maximum wait on an in-flight fetch.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            return Err(Error::config("metadata.ttl_secs must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
