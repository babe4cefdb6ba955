//! Workload container abstraction.
//!
//! [`LocalWorkload`] materializes the container under a root directory:
//! pushed files land at `<root>/<path>`, the service plan at
//! `<root>/.lpo/plan.json`, and a `<root>/.lpo/running` marker stands in
//! for the service process.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tracing::{debug, info};

use lpo_reconciler::{DesiredWorkloadSpec, WorkloadFile};

/// The container running the patch server.
pub trait Workload {
    fn can_connect(&self) -> bool;

    fn push_file(&self, file: &WorkloadFile) -> io::Result<()>;

    /// Replace the service plan.
    fn replan(&self, spec: &DesiredWorkloadSpec) -> io::Result<()>;

    fn restart(&self) -> io::Result<()>;

    fn stop(&self) -> io::Result<()>;

    fn is_running(&self) -> bool;
}

/// Directory-backed workload.
#[derive(Debug, Clone)]
pub struct LocalWorkload {
    root: PathBuf,
}

impl LocalWorkload {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Host path for a container path.
    pub fn resolve(&self, container_path: &str) -> PathBuf {
        self.root.join(container_path.trim_start_matches('/'))
    }

    pub fn plan_path(&self) -> PathBuf {
        self.root.join(".lpo").join("plan.json")
    }

    fn running_marker(&self) -> PathBuf {
        self.root.join(".lpo").join("running")
    }
}

impl Workload for LocalWorkload {
    fn can_connect(&self) -> bool {
        self.root.is_dir()
    }

    fn push_file(&self, file: &WorkloadFile) -> io::Result<()> {
        let path = self.resolve(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.content)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(file.mode))?;
        debug!(path = %file.path, "file pushed");
        Ok(())
    }

    fn replan(&self, spec: &DesiredWorkloadSpec) -> io::Result<()> {
        let plan = spec.to_plan_json().map_err(io::Error::other)?;
        let path = self.plan_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, plan)?;
        info!(service = %spec.service, "service plan updated");
        Ok(())
    }

    fn restart(&self) -> io::Result<()> {
        let marker = self.running_marker();
        if let Some(parent) = marker.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&marker, b"")?;
        info!("service restarted");
        Ok(())
    }

    fn stop(&self) -> io::Result<()> {
        match fs::remove_file(self.running_marker()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        info!("service stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running_marker().exists()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn push_file_creates_parents_and_mode() {
        let dir = tempfile::tempdir().unwrap();
        let workload = LocalWorkload::new(dir.path());
        workload
            .push_file(&WorkloadFile {
                path: "/etc/logrotate.d/livepatch".into(),
                content: "x".into(),
                mode: 0o644,
            })
            .unwrap();

        let path = dir.path().join("etc/logrotate.d/livepatch");
        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);
    }

    #[test]
    fn restart_and_stop_toggle_running() {
        let dir = tempfile::tempdir().unwrap();
        let workload = LocalWorkload::new(dir.path());
        assert!(!workload.is_running());
        workload.restart().unwrap();
        assert!(workload.is_running());
        workload.stop().unwrap();
        assert!(!workload.is_running());
        workload.stop().unwrap();
    }

    #[test]
    fn replan_writes_plan() {
        let dir = tempfile::tempdir().unwrap();
        let workload = LocalWorkload::new(dir.path());
        let spec = DesiredWorkloadSpec {
            service: "livepatch".into(),
            command: vec!["true".into()],
            environment: BTreeMap::new(),
            files: vec![],
        };
        workload.replan(&spec).unwrap();
        let plan: DesiredWorkloadSpec =
            serde_json::from_str(&fs::read_to_string(workload.plan_path()).unwrap()).unwrap();
        assert_eq!(plan, spec);
    }

    #[test]
    fn missing_root_is_unreachable() {
        let workload = LocalWorkload::new("/nonexistent/lpo-root");
        assert!(!workload.can_connect());
    }
}
