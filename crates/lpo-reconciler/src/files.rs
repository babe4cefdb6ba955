//! Static workload paths and file contents.

use crate::decision::WorkloadFile;

/// Service name in the process plan.
pub const SERVICE_NAME: &str = "livepatch";

/// Server binary inside the workload container.
pub const SERVER_BINARY: &str = "/usr/local/bin/livepatch-server";

/// Log file the server output is appended to.
pub const LOG_PATH: &str = "/var/log/livepatch";

/// Trusted CA bundle for the contracts service.
pub const CA_BUNDLE_PATH: &str = "/usr/local/share/ca-certificates/trusted-contracts.ca.crt";

pub const LOGROTATE_PATH: &str = "/etc/logrotate.d/livepatch";

pub const FILE_MODE: u32 = 0o644;

pub const LOGROTATE_POLICY: &str = "\
/var/log/livepatch {
    su root root
    size 10M
    rotate 3
    copytruncate
    delaycompress
    compress
    notifempty
    missingok
}
";

/// Entrypoint: run the server and tee its output into the rotated log.
pub fn server_command() -> Vec<String> {
    vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        format!("{SERVER_BINARY} 2>&1 | tee -a {LOG_PATH}"),
    ]
}

/// The log-rotation policy file. Static, so it can be pushed regardless
/// of readiness.
pub fn logrotate_file() -> WorkloadFile {
    WorkloadFile {
        path: LOGROTATE_PATH.to_string(),
        content: LOGROTATE_POLICY.to_string(),
        mode: FILE_MODE,
    }
}
