//! Reconciler error types.

use thiserror::Error;

/// Errors that abort a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("environment key {0:?} does not match ^LP_[A-Z0-9_]+$")]
    InvalidEnvironmentKey(String),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
