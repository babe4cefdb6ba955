use thiserror::Error;

use lpo_state::StateError;

/// Errors raised while running an action.
///
/// Display strings are reported verbatim to the operator, so they carry
/// the operation name as a prefix where one applies.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{operation} failed: database connection string not set")]
    MissingConnectionString { operation: &'static str },

    #[error(
        "{operation} failed: non-zero exit code {code} executing {}, stdout='{stdout}', stderr='{stderr}'",
        .argv.join(" ")
    )]
    NonZeroExit {
        operation: &'static str,
        code: i32,
        argv: Vec<String>,
        stdout: String,
        stderr: String,
    },

    #[error("{operation} failed: {source}")]
    Exec {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} failed: admin container is not reachable")]
    AdminUnreachable { operation: &'static str },

    #[error("cannot fetch the resource token: unit is not the leader")]
    NotLeader,

    #[error("cannot fetch the resource token: no contract token provided")]
    NoContractToken,

    #[error("cannot fetch the resource token: token service returned no token")]
    NoToken,

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("state error: {0}")]
    State(#[from] StateError),
}

pub type ActionResult<T> = Result<T, ActionError>;
