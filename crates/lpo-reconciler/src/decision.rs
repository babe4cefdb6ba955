//! Reconciliation outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lpo_core::UnitStatus;

/// A file to push into the workload container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadFile {
    /// Absolute path inside the workload container.
    pub path: String,
    pub content: String,
    /// Unix permission bits.
    pub mode: u32,
}

/// Everything the managed process should be configured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredWorkloadSpec {
    /// Service name in the workload's process plan.
    pub service: String,
    /// Process entrypoint.
    pub command: Vec<String>,
    pub environment: BTreeMap<String, String>,
    /// Sorted by path.
    pub files: Vec<WorkloadFile>,
}

impl DesiredWorkloadSpec {
    /// Stable JSON rendering of the spec (the service plan).
    pub fn to_plan_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Inputs are complete; apply this spec.
    Apply(DesiredWorkloadSpec),
    /// A required input is missing.
    Blocked(String),
    /// A dependency is transiently unavailable.
    Waiting(String),
}

impl Decision {
    /// Status to report while this decision stands.
    ///
    /// `Apply` maps to `Active`, though callers only report it once the
    /// spec has actually been applied.
    pub fn status(&self) -> UnitStatus {
        match self {
            Decision::Apply(_) => UnitStatus::Active,
            Decision::Blocked(reason) => UnitStatus::Blocked(reason.clone()),
            Decision::Waiting(reason) => UnitStatus::Waiting(reason.clone()),
        }
    }

    pub fn spec(&self) -> Option<&DesiredWorkloadSpec> {
        match self {
            Decision::Apply(spec) => Some(spec),
            _ => None,
        }
    }
}
