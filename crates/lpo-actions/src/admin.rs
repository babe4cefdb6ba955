//! Admin container abstraction.

use async_trait::async_trait;

/// Captured result of a command run in the admin container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// The sidecar container that ships the schema tool.
#[async_trait]
pub trait AdminContainer: Send + Sync {
    /// Whether commands can currently be run.
    fn can_connect(&self) -> bool;

    /// Run `argv` to completion and capture its output.
    ///
    /// A non-zero exit is not an error here; only failing to launch is.
    async fn exec(&self, argv: &[String]) -> std::io::Result<ExecOutput>;
}
