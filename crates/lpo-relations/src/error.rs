//! Relation error types.

use thiserror::Error;

use crate::integration::Channel;

/// Errors raised while resolving relation data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelationError {
    #[error("Integration with both database relations is not allowed; `{active}` is already activated.")]
    ConflictingIntegration { active: Channel },

    #[error("invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid database endpoint: {0}")]
    InvalidEndpoint(String),
}

pub type RelationResult<T> = Result<T, RelationError>;
