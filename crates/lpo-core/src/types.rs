//! Shared types used across the operator crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Contracts service used when `contracts.url` is not configured.
pub const DEFAULT_CONTRACTS_URL: &str = "https://contracts.canonical.com";

/// Database name used when a relation does not name one.
pub const DEFAULT_DATABASE_NAME: &str = "livepatch-server";

/// Workload status reported back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum UnitStatus {
    /// Workload is configured and running.
    Active,
    /// A required input is missing; resolves when it appears.
    Blocked(String),
    /// A dependency is transiently unavailable.
    Waiting(String),
    /// The operator is doing work on the workload.
    Maintenance(String),
}

impl UnitStatus {
    pub fn name(&self) -> &'static str {
        match self {
            UnitStatus::Active => "active",
            UnitStatus::Blocked(_) => "blocked",
            UnitStatus::Waiting(_) => "waiting",
            UnitStatus::Maintenance(_) => "maintenance",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UnitStatus::Active => "",
            UnitStatus::Blocked(m) | UnitStatus::Waiting(m) | UnitStatus::Maintenance(m) => m,
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Active => f.write_str("active"),
            other => write!(f, "{}: {}", other.name(), other.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(UnitStatus::Active.to_string(), "active");
        assert_eq!(
            UnitStatus::Waiting("service stopped".into()).to_string(),
            "waiting: service stopped"
        );
        assert_eq!(UnitStatus::Blocked("x".into()).message(), "x");
    }

    #[test]
    fn status_serializes_tagged() {
        let json = serde_json::to_string(&UnitStatus::Blocked("no db".into())).unwrap();
        assert_eq!(json, r#"{"status":"blocked","message":"no db"}"#);
    }
}
