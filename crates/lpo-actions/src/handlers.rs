//! Action parsing and handlers.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, warn};

use lpo_core::UnitStatus;
use lpo_state::{Leadership, PersistentState, StateError, StateStore};

use crate::admin::AdminContainer;
use crate::error::{ActionError, ActionResult};
use crate::schema::{CHECK_OPERATION, SchemaTool, UPGRADE_OPERATION};
use crate::token::TokenService;

pub const SCHEMA_MIGRATION_DONE: &str = "Schema migration done";

/// An operator-invoked action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SchemaUpgrade,
    SchemaVersion,
    GetResourceToken { contract_token: String },
    Restart,
}

impl Action {
    /// Resolve an action by name with its `key=value` parameters.
    pub fn parse(name: &str, params: &BTreeMap<String, String>) -> ActionResult<Self> {
        match name {
            "schema-upgrade" => Ok(Action::SchemaUpgrade),
            "schema-version" => Ok(Action::SchemaVersion),
            "get-resource-token" => Ok(Action::GetResourceToken {
                contract_token: params.get("contract-token").cloned().unwrap_or_default(),
            }),
            "restart" => Ok(Action::Restart),
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::SchemaUpgrade => "schema-upgrade",
            Action::SchemaVersion => "schema-version",
            Action::GetResourceToken { .. } => "get-resource-token",
            Action::Restart => "restart",
        }
    }
}

/// What an action reports back.
///
/// `failure` marks the action as failed; `results` are returned either
/// way. `status` is the unit status to set, if the action changes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    pub results: BTreeMap<String, Value>,
    pub failure: Option<String>,
    pub status: Option<UnitStatus>,
}

impl ActionOutcome {
    pub fn result(key: &str, value: impl Into<Value>) -> Self {
        let mut results = BTreeMap::new();
        results.insert(key.to_string(), value.into());
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    /// JSON view: results plus a `failure` key when failed.
    pub fn to_json(&self) -> Value {
        let mut map: serde_json::Map<String, Value> =
            self.results.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        if let Some(failure) = &self.failure {
            map.insert("failure".to_string(), Value::String(failure.clone()));
        }
        Value::Object(map)
    }
}

fn require_dsn<'a>(state: &'a PersistentState, operation: &'static str) -> ActionResult<&'a str> {
    state
        .connection_string()
        .ok_or(ActionError::MissingConnectionString { operation })
}

// ── schema-upgrade ──────────────────────────────────────────────

pub async fn schema_upgrade<A: AdminContainer + ?Sized>(
    admin: &A,
    tool: &SchemaTool,
    state: &PersistentState,
) -> ActionOutcome {
    let run = async {
        let dsn = require_dsn(state, UPGRADE_OPERATION)?;
        tool.upgrade(admin, dsn).await
    };
    match run.await {
        Ok(()) => ActionOutcome::result("result", "schema upgrade completed")
            .with_status(UnitStatus::Waiting(SCHEMA_MIGRATION_DONE.to_string())),
        Err(e) => {
            warn!(error = %e, "schema-upgrade action failed");
            ActionOutcome::failed(e.to_string())
        }
    }
}

// ── schema-version ──────────────────────────────────────────────

pub async fn schema_version<A: AdminContainer + ?Sized>(
    admin: &A,
    tool: &SchemaTool,
    state: &PersistentState,
) -> ActionOutcome {
    let run = async {
        let dsn = require_dsn(state, CHECK_OPERATION)?;
        tool.migration_required(admin, dsn).await
    };
    match run.await {
        Ok(required) => ActionOutcome::result("migration-required", required),
        Err(e) => {
            warn!(error = %e, "schema-version action failed");
            ActionOutcome::failed(e.to_string())
        }
    }
}

// ── get-resource-token ──────────────────────────────────────────

/// Exchange a contract token for a resource token and store it.
///
/// Refusals are reported under the `error` result key rather than as an
/// action failure.
pub async fn get_resource_token<T: TokenService + ?Sized>(
    store: &StateStore,
    leadership: Leadership,
    contract_token: &str,
    tokens: &T,
) -> ActionOutcome {
    match fetch_and_store(store, leadership, contract_token, tokens).await {
        Ok(()) => ActionOutcome::result("result", "resource token set"),
        Err(e @ (ActionError::NotLeader | ActionError::NoContractToken | ActionError::NoToken)) => {
            warn!(error = %e, "get-resource-token refused");
            ActionOutcome::result("error", e.to_string())
        }
        Err(e) => ActionOutcome::failed(e.to_string()),
    }
}

async fn fetch_and_store<T: TokenService + ?Sized>(
    store: &StateStore,
    leadership: Leadership,
    contract_token: &str,
    tokens: &T,
) -> ActionResult<()> {
    let writer = match store.writer(leadership) {
        Ok(writer) => writer,
        Err(StateError::NotLeader) => return Err(ActionError::NotLeader),
        Err(e) => return Err(e.into()),
    };
    if contract_token.is_empty() {
        return Err(ActionError::NoContractToken);
    }

    let machine_token = tokens.machine_token(contract_token).await.ok_or(ActionError::NoToken)?;
    let resource_token = tokens.resource_token(&machine_token).await.ok_or(ActionError::NoToken)?;

    writer.set_resource_token(&resource_token)?;
    info!("resource token stored");
    Ok(())
}
