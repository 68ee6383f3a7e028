//! Error types for role graph mutation.

use thiserror::Error;

use crate::roles::RoleId;

/// Error type for role and hierarchy operations.
///
/// Every variant is returned before any state changes, so a failed call
/// leaves the graph exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    /// The permission is already granted directly to the role.
    #[error("role '{role}' already has permission '{permission}'")]
    AlreadyPermitted { role: String, permission: String },

    /// The permission is not granted directly to the role.
    #[error("role '{role}' does not have permission '{permission}'")]
    NotPermitted { role: String, permission: String },

    /// A parent with this name is already linked.
    #[error("role '{role}' already has parent '{parent}'")]
    AlreadyParent { role: String, parent: String },

    /// No direct parent with this name exists.
    #[error("role '{role}' has no parent '{parent}'")]
    NoParent { role: String, parent: String },

    /// A cached role can only be linked under a parent that tracks children.
    #[error("role '{parent}' is not a cached role and cannot track child '{role}'")]
    NoCachedRoler { role: String, parent: String },

    /// The link would make a role its own ancestor.
    #[error("linking '{role}' under '{parent}' would create an inheritance cycle")]
    CircularInheritance { role: String, parent: String },

    /// The handle does not refer to a role of this graph.
    #[error("unknown role handle {0}")]
    UnknownRole(RoleId),
}

/// Result type for role graph operations.
pub type Result<T> = std::result::Result<T, RoleError>;
