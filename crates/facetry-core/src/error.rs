//! Error types for facetry-core.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for Facetry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across Facetry crates.
///
/// Read-path and write-path backend failures are usually logged and
/// swallowed by the callers that own the failure policy; only
/// [`Error::FacetDecoding`] is meant to reach the search caller.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or missing configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error without path context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a specific path.
    #[error("I/O error on {path}: {source}")]
    IoWithPath {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Search engine transport or engine-side failure.
    #[error("Backend error: {message}")]
    Backend {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A facet key returned by the engine could not be parsed back into the
    /// facet's native value type.
    #[error("Cannot decode facet key '{key}' of '{attribute}' as {expected}")]
    FacetDecoding {
        /// Encoded attribute the key was returned for
        attribute: String,
        /// Raw key as returned by the engine
        key: String,
        /// Native type the key was expected to parse as
        expected: &'static str,
    },

    /// A capability the engine does not provide.
    #[error("Unsupported: {capability}")]
    Unsupported {
        /// Description of the missing capability
        capability: String,
    },

    /// Waiting on a shared operation exceeded its deadline.
    #[error("Timed out after {seconds}s waiting for {what}")]
    Timeout {
        /// What was being waited on
        what: String,
        /// Timeout in seconds
        seconds: u64,
    },
}

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Transport failures and timeouts are transient; decoding and
    /// configuration errors are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Backend { .. } => true,
            Error::Timeout { .. } => true,
            Error::Io(_) | Error::IoWithPath { .. } => true,
            Error::Config { .. } => false,
            Error::Serialization(_) => false,
            Error::TomlParse(_) => false,
            Error::FacetDecoding { .. } => false,
            Error::Unsupported { .. } => false,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates an I/O error carrying the failing path.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new backend error with a message.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend error with a message and source error.
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a facet decoding error.
    pub fn facet_decoding(
        attribute: impl Into<String>,
        key: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Error::FacetDecoding {
            attribute: attribute.into(),
            key: key.into(),
            expected,
        }
    }

    /// Creates an unsupported-capability error.
    pub fn unsupported<S: Into<String>>(capability: S) -> Self {
        Error::Unsupported {
            capability: capability.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(what: impl Into<String>, seconds: u64) -> Self {
        Error::Timeout {
            what: what.into(),
            seconds,
        }
    }
}
