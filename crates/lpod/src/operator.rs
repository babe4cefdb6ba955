//! Event dispatch.
//!
//! Every config-driven event runs the same pass:
//!
//! 1. push the log-rotation policy if the workload is reachable
//! 2. run the readiness gate
//! 3. on `Apply`, check the database schema; the leader upgrades it, other
//!    replicas wait
//! 4. push files, replan and restart the service
//!
//! Relation events first feed the credential resolver and persist its
//! result. A conflicting relation aborts the event before anything is
//! written.

use tracing::{debug, info, warn};

use lpo_actions::handlers::{self, Action, ActionOutcome};
use lpo_actions::{AdminContainer, SchemaTool};
use lpo_core::{ConfigOptions, UnitStatus};
use lpo_reconciler::gate::BLOCKED_NO_DATABASE;
use lpo_reconciler::{Decision, DesiredWorkloadSpec, ReconcileInputs, logrotate_file, reconcile};
use lpo_relations::{DatabaseIntegration, RelationEvent};
use lpo_state::{Leadership, StateError, StateStore};

use crate::error::OperatorResult;
use crate::event::Event;
use crate::tokens::TokenClientFactory;
use crate::workload::Workload;

pub const WAITING_WORKLOAD: &str = "Waiting to connect - livepatch container.";
pub const WAITING_SCHEMA_MIGRATION: &str = "Waiting for schema migration";
pub const SCHEMA_MIGRATION_RUNNING: &str = "Running schema migration";
pub const SERVICE_STOPPED: &str = "service stopped";
pub const SERVICE_NOT_RUNNING: &str = "service not running";

const INTEGRATION_RECORD: &str = "database-integration";
const STATUS_RECORD: &str = "status";

pub struct Operator<W, A, T> {
    store: StateStore,
    options: ConfigOptions,
    leadership: Leadership,
    workload: W,
    admin: A,
    tokens: T,
    schema_tool: SchemaTool,
}

impl<W, A, T> Operator<W, A, T>
where
    W: Workload,
    A: AdminContainer,
    T: TokenClientFactory,
{
    pub fn new(
        store: StateStore,
        options: ConfigOptions,
        leadership: Leadership,
        workload: W,
        admin: A,
        tokens: T,
    ) -> Self {
        Self {
            store,
            options,
            leadership,
            workload,
            admin,
            tokens,
            schema_tool: SchemaTool::default(),
        }
    }

    pub fn with_schema_tool(mut self, schema_tool: SchemaTool) -> Self {
        self.schema_tool = schema_tool;
        self
    }

    pub fn workload(&self) -> &W {
        &self.workload
    }

    pub fn admin(&self) -> &A {
        &self.admin
    }

    /// Last recorded unit status.
    pub fn status(&self) -> OperatorResult<Option<UnitStatus>> {
        Ok(self.store.get_unit_record(STATUS_RECORD)?)
    }

    /// Handle one lifecycle event and record the resulting status.
    pub async fn handle(&self, event: &Event) -> OperatorResult<UnitStatus> {
        info!(%event, leader = self.leadership.is_leader(), "handling event");
        let status = match event {
            Event::Stop => {
                self.workload.stop()?;
                UnitStatus::Waiting(SERVICE_STOPPED.to_string())
            }
            Event::UpdateStatus => {
                if self.workload.is_running() {
                    UnitStatus::Active
                } else {
                    UnitStatus::Waiting(SERVICE_NOT_RUNNING.to_string())
                }
            }
            Event::RelationChanged { channel, data } => {
                self.apply_relation(&RelationEvent::changed(*channel, data))?;
                self.reconcile_pass().await?
            }
            Event::RelationDeparted { channel } => {
                self.apply_relation(&RelationEvent::Departed(*channel))?;
                self.reconcile_pass().await?
            }
            _ => self.reconcile_pass().await?,
        };
        self.record_status(&status)?;
        Ok(status)
    }

    /// Run an action.
    ///
    /// Nothing escapes: store, workload and token client errors all end
    /// up in the outcome's `failure` or `error` result.
    pub async fn run_action(&self, action: &Action) -> ActionOutcome {
        info!(action = action.name(), "running action");
        let outcome = match action {
            Action::SchemaUpgrade => match self.store.persistent_state() {
                Ok(state) => {
                    let running = UnitStatus::Maintenance(SCHEMA_MIGRATION_RUNNING.to_string());
                    self.note_status(&running);
                    handlers::schema_upgrade(&self.admin, &self.schema_tool, &state).await
                }
                Err(e) => ActionOutcome::failed(e.to_string()),
            },
            Action::SchemaVersion => match self.store.persistent_state() {
                Ok(state) => handlers::schema_version(&self.admin, &self.schema_tool, &state).await,
                Err(e) => ActionOutcome::failed(e.to_string()),
            },
            Action::GetResourceToken { contract_token } => {
                let outcome = match self.tokens.build(&self.options) {
                    Ok(client) => {
                        handlers::get_resource_token(
                            &self.store,
                            self.leadership,
                            contract_token,
                            &client,
                        )
                        .await
                    }
                    Err(e) => {
                        warn!(error = %e, "token client unavailable");
                        ActionOutcome::result(
                            "error",
                            format!("cannot fetch the resource token: {e}"),
                        )
                    }
                };
                if outcome.is_failure() || outcome.results.contains_key("error") {
                    outcome
                } else {
                    self.settle(outcome).await
                }
            }
            Action::Restart => self.settle(ActionOutcome::result("result", "restarted")).await,
        };
        if let Some(status) = &outcome.status {
            if let Err(e) = self.record_status(status) {
                warn!(error = %e, "action status not recorded");
                let mut outcome = outcome;
                outcome.failure.get_or_insert_with(|| e.to_string());
                return outcome;
            }
        }
        outcome
    }

    /// Re-run the pass after an action. A failing pass keeps the action's
    /// results, marks it failed and blocks the unit.
    async fn settle(&self, mut outcome: ActionOutcome) -> ActionOutcome {
        match self.reconcile_pass().await {
            Ok(status) => outcome.with_status(status),
            Err(e) => {
                warn!(error = %e, "reconcile pass after action failed");
                outcome.failure = Some(e.to_string());
                outcome.with_status(UnitStatus::Blocked(e.to_string()))
            }
        }
    }

    fn apply_relation(&self, event: &RelationEvent) -> OperatorResult<()> {
        let current: DatabaseIntegration = self
            .store
            .get_unit_record(INTEGRATION_RECORD)?
            .unwrap_or_default();
        let transition = current.apply(event)?;

        if let Some(dsn) = &transition.connection_string {
            match self.store.writer(self.leadership) {
                Ok(writer) => {
                    writer.set_connection_string(dsn)?;
                    info!(channel = %event.channel(), "connection string updated");
                }
                Err(StateError::NotLeader) => {
                    debug!("not leader; connection string left to the leader");
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.store.put_unit_record(INTEGRATION_RECORD, &transition.next)?;
        Ok(())
    }

    async fn reconcile_pass(&self) -> OperatorResult<UnitStatus> {
        let workload_up = self.workload.can_connect();
        if workload_up {
            self.workload.push_file(&logrotate_file())?;
        }

        let state = self.store.persistent_state()?;
        let decision = reconcile(&ReconcileInputs {
            options: &self.options,
            state: &state,
            leadership: self.leadership,
            admin_reachable: self.admin.can_connect(),
        })?;
        let spec = match decision {
            Decision::Apply(spec) => spec,
            other => {
                let status = other.status();
                info!(%status, "workload not applied");
                return Ok(status);
            }
        };
        if !workload_up {
            return Ok(UnitStatus::Waiting(WAITING_WORKLOAD.to_string()));
        }
        let Some(dsn) = state.connection_string() else {
            return Ok(UnitStatus::Blocked(BLOCKED_NO_DATABASE.to_string()));
        };

        match self.schema_tool.migration_required(&self.admin, dsn).await {
            Ok(false) => {}
            Ok(true) if self.leadership.is_leader() => {
                info!("schema migration required; upgrading");
                if let Err(e) = self.schema_tool.upgrade(&self.admin, dsn).await {
                    warn!(error = %e, "schema upgrade failed");
                    return Ok(UnitStatus::Blocked(e.to_string()));
                }
            }
            Ok(true) => return Ok(UnitStatus::Waiting(WAITING_SCHEMA_MIGRATION.to_string())),
            Err(e) => {
                warn!(error = %e, "schema version check failed");
                return Ok(UnitStatus::Blocked(e.to_string()));
            }
        }

        self.apply(&spec)?;
        Ok(UnitStatus::Active)
    }

    fn apply(&self, spec: &DesiredWorkloadSpec) -> OperatorResult<()> {
        for file in &spec.files {
            self.workload.push_file(file)?;
        }
        self.workload.replan(spec)?;
        self.workload.restart()?;
        info!(vars = spec.environment.len(), "workload applied");
        Ok(())
    }

    fn record_status(&self, status: &UnitStatus) -> OperatorResult<()> {
        self.store.put_unit_record(STATUS_RECORD, status)?;
        debug!(%status, "unit status recorded");
        Ok(())
    }

    /// Record an interim status; failure only loses the interim value.
    fn note_status(&self, status: &UnitStatus) {
        if let Err(e) = self.record_status(status) {
            warn!(error = %e, "interim status not recorded");
        }
    }
}
