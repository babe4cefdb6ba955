//! Local admin container: runs the schema tool as a child process.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use lpo_actions::{AdminContainer, ExecOutput};

#[derive(Debug, Clone)]
pub struct LocalAdmin {
    tool: PathBuf,
}

impl LocalAdmin {
    /// `tool` is the schema tool binary; the container is considered
    /// reachable while it exists.
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }
}

#[async_trait]
impl AdminContainer for LocalAdmin {
    fn can_connect(&self) -> bool {
        self.tool.exists()
    }

    async fn exec(&self, argv: &[String]) -> std::io::Result<ExecOutput> {
        let Some((program, args)) = argv.split_first() else {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"));
        };
        debug!(%program, "exec in admin container");
        let output = Command::new(program).args(args).output().await?;
        Ok(ExecOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
