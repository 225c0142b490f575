//! Access control error types.

use thiserror::Error;

/// Errors raised while parsing access control names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Role name is not one of the known staff roles.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Capability name is not in the permission table.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// Module name is not a known console module.
    #[error("unknown module: {0}")]
    UnknownModule(String),
}
