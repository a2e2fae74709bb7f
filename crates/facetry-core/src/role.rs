//! Server roles and the index-mutation guard.
//!
//! In a load-balanced deployment only one node owns the search indexes.
//! Index-structural mutations (create, delete-by-filter, clear, upsert) run
//! only when the current role can mutate indexes; every other role treats
//! them as no-ops.
//!
//! ```rust
//! use facetry_core::role::{ServerRole, ServerRoleAccessor};
//!
//! let role = ServerRole::Subscriber;
//! assert!(!role.current_role().can_mutate_indexes());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// ServerRole
// ============================================================================

/// Role of this process within a deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerRole {
    /// Standalone node; owns its indexes.
    #[default]
    Single,
    /// Load-balanced node that schedules and publishes; owns the indexes.
    SchedulingPublisher,
    /// Load-balanced replica that only serves reads.
    Subscriber,
    /// Role not yet determined.
    Unknown,
}

impl ServerRole {
    /// Returns `true` if this role may create, clear, or modify indexes.
    pub fn can_mutate_indexes(&self) -> bool {
        !matches!(self, Self::Subscriber)
    }
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::SchedulingPublisher => write!(f, "scheduling_publisher"),
            Self::Subscriber => write!(f, "subscriber"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for ServerRole {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "scheduling_publisher" | "schedulingpublisher" => Ok(Self::SchedulingPublisher),
            "subscriber" => Ok(Self::Subscriber),
            "unknown" => Ok(Self::Unknown),
            other => Err(crate::Error::config(format!("Unknown server role '{other}'"))),
        }
    }
}

// ============================================================================
// ServerRoleAccessor
// ============================================================================

/// Source of the current server role.
///
/// Consulted before every index mutation, so implementations may change
/// their answer at runtime (e.g. after an election).
pub trait ServerRoleAccessor: Send + Sync {
    /// The role this process currently holds.
    fn current_role(&self) -> ServerRole;
}

impl ServerRoleAccessor for ServerRole {
    fn current_role(&self) -> ServerRole {
        *self
    }
}
