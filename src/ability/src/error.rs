//! Error types for the permission engine

use thiserror::Error;

use crate::scope::ScopeError;

/// Permission engine errors
///
/// Only parsing raises errors. Evaluating an [`Ability`](crate::Ability)
/// never fails; an unmatched permission is simply `false`.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Malformed scope layout, unknown scope key or unsupported scope value
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Permission string without a subject or action segment
    #[error("Invalid permission format: {0}")]
    InvalidPermissionFormat(String),

    /// Condition block that is not a valid permissive object literal
    #[error("Invalid conditions '{fragment}' in permission '{permission}'")]
    InvalidConditions {
        /// Offending condition text
        fragment: String,
        /// Full permission string the block came from
        permission: String,
    },
}

/// Result type for permission operations
pub type Result<T> = std::result::Result<T, AuthzError>;
