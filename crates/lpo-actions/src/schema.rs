//! Schema tool invocation.
//!
//! The tool is run as `<binary> <upgrade|check> <upgrades-dir> --db <dsn>`.
//! For `check`, exit code 2 means a migration is required.

use tracing::{debug, info, warn};

use crate::admin::AdminContainer;
use crate::error::{ActionError, ActionResult};

pub const DEFAULT_SCHEMA_TOOL: &str = "/usr/local/bin/livepatch-schema-tool";
pub const DEFAULT_UPGRADES_DIR: &str = "/etc/livepatch/schema-upgrades";

const MIGRATION_REQUIRED_CODE: i32 = 2;

pub const UPGRADE_OPERATION: &str = "schema migration";
pub const CHECK_OPERATION: &str = "schema version check";

/// Location of the schema tool and its migration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTool {
    pub binary: String,
    pub upgrades_dir: String,
}

impl Default for SchemaTool {
    fn default() -> Self {
        Self {
            binary: DEFAULT_SCHEMA_TOOL.to_string(),
            upgrades_dir: DEFAULT_UPGRADES_DIR.to_string(),
        }
    }
}

impl SchemaTool {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    fn argv(&self, subcommand: &str, dsn: &str) -> Vec<String> {
        vec![
            self.binary.clone(),
            subcommand.to_string(),
            self.upgrades_dir.clone(),
            "--db".to_string(),
            dsn.to_string(),
        ]
    }

    /// Apply pending migrations.
    pub async fn upgrade<A: AdminContainer + ?Sized>(
        &self,
        admin: &A,
        dsn: &str,
    ) -> ActionResult<()> {
        let argv = self.argv("upgrade", dsn);
        let output = run(admin, UPGRADE_OPERATION, &argv).await?;
        if !output.success() {
            warn!(code = output.code, "schema upgrade failed");
            return Err(non_zero(UPGRADE_OPERATION, argv, output));
        }
        info!("schema upgrade completed");
        Ok(())
    }

    /// Whether the database schema lags behind the shipped migrations.
    pub async fn migration_required<A: AdminContainer + ?Sized>(
        &self,
        admin: &A,
        dsn: &str,
    ) -> ActionResult<bool> {
        let argv = self.argv("check", dsn);
        let output = run(admin, CHECK_OPERATION, &argv).await?;
        match output.code {
            0 => Ok(false),
            MIGRATION_REQUIRED_CODE => {
                debug!("schema migration required");
                Ok(true)
            }
            _ => Err(non_zero(CHECK_OPERATION, argv, output)),
        }
    }
}

async fn run<A: AdminContainer + ?Sized>(
    admin: &A,
    operation: &'static str,
    argv: &[String],
) -> ActionResult<crate::admin::ExecOutput> {
    if !admin.can_connect() {
        return Err(ActionError::AdminUnreachable { operation });
    }
    admin
        .exec(argv)
        .await
        .map_err(|source| ActionError::Exec { operation, source })
}

fn non_zero(
    operation: &'static str,
    argv: Vec<String>,
    output: crate::admin::ExecOutput,
) -> ActionError {
    ActionError::NonZeroExit {
        operation,
        code: output.code,
        argv,
        stdout: output.stdout,
        stderr: output.stderr,
    }
}
