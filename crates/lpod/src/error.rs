use thiserror::Error;

use lpo_reconciler::ReconcileError;
use lpo_relations::RelationError;
use lpo_state::StateError;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("relation error: {0}")]
    Relation(#[from] RelationError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("workload I/O error: {0}")]
    Workload(#[from] std::io::Error),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("event {0} requires a relation channel")]
    MissingChannel(String),
}

pub type OperatorResult<T> = Result<T, OperatorError>;
