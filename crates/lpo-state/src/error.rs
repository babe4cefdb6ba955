//! Errors raised by the operator database.

use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

/// Failure reading or writing operator state.
///
/// redb errors are kept as their messages, tagged by the step that failed.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("cannot open operator database: {0}")]
    Open(String),

    #[error("operator database transaction failed: {0}")]
    Transaction(String),

    #[error("cannot open state table: {0}")]
    Table(String),

    #[error("cannot read state: {0}")]
    Read(String),

    #[error("cannot write state: {0}")]
    Write(String),

    #[error("cannot encode unit record: {0}")]
    Serialize(String),

    #[error("cannot decode unit record: {0}")]
    Deserialize(String),

    #[error("unit is not the leader; shared state is read-only")]
    NotLeader,
}
