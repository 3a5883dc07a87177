//! Error types for router operations.
//!
//! An unreachable destination is not an error: delivery operations
//! report it as `false`. Likewise an empty command queue is `None`.

use crate::message::SystemId;
use thiserror::Error;

/// Identity resolution failures reported by an [`crate::IdentityResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No system is known under this name
    #[error("Unknown system name: {0}")]
    UnknownName(String),

    /// No system is known under this id
    #[error("Unknown system id: {0}")]
    UnknownId(SystemId),
}

/// Errors that can occur in router operations.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Identity resolution failed; propagated unchanged from the resolver
    #[error("Identity resolution failed: {0}")]
    Identity(#[from] IdentityError),
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
