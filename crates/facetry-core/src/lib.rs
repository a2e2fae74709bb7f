//! Facetry Core: shared errors, configuration, and server-role types.
//!
//! This crate has no internal Facetry dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: Provider configuration loaded from TOML and the environment
//! - [`role`]: Server roles and the index-mutation guard

pub mod config;
pub mod error;
pub mod role;

// Re-export key types at crate root for convenience
pub use config::{MetadataCacheConfig, ProviderConfig};
pub use error::{Error, Result};
pub use role::{ServerRole, ServerRoleAccessor};
