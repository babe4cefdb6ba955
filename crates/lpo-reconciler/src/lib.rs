//! lpo-reconciler — the reconciliation pass.
//!
//! A pass reads the option set, the shared state, and the reachability of
//! the admin container, and returns a [`Decision`]: either a complete
//! [`DesiredWorkloadSpec`] or the reason the workload cannot start yet.
//! The pass performs no I/O; applying the result is the caller's job.
//!
//! # Components
//!
//! - **`decision`** — `Decision`, `DesiredWorkloadSpec`, `WorkloadFile`
//! - **`files`** — static workload file contents and paths
//! - **`gate`** — ordered readiness checks and spec assembly

pub mod decision;
pub mod error;
pub mod files;
pub mod gate;

pub use decision::{Decision, DesiredWorkloadSpec, WorkloadFile};
pub use error::{ReconcileError, ReconcileResult};
pub use files::logrotate_file;
pub use gate::{ReconcileInputs, reconcile};
