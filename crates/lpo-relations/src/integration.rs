//! Database integration state machine.
//!
//! ```text
//! Unset ──legacy event──▶ Legacy ──standard event──▶ ConflictingIntegration
//!   │
//!   └──standard event──▶ Standard ──legacy event──▶ ConflictingIntegration
//! ```
//!
//! `Departed` on the active channel returns to `Unset`. The resolved
//! connection string is never cleared by this machine; it stays in
//! shared state until a new one replaces it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lpo_core::DEFAULT_DATABASE_NAME;

use crate::descriptor::ConnectionDescriptor;
use crate::dsn::build_connection_string;
use crate::error::{RelationError, RelationResult};

/// The two mutually exclusive credential channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Legacy,
    Standard,
}

impl Channel {
    /// Relation endpoint name of the channel.
    pub fn relation_name(&self) -> &'static str {
        match self {
            Channel::Legacy => "database-legacy",
            Channel::Standard => "database",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.relation_name())
    }
}

/// Primary/standby view published over the legacy channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyState {
    pub primary: Option<ConnectionDescriptor>,
    /// Tracked for visibility only; not used for connectivity.
    pub standbys: Vec<ConnectionDescriptor>,
}

/// Credentials published over the standard channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardState {
    pub username: String,
    pub endpoints: Vec<String>,
    pub database: String,
    /// Whether a complete credential set has been seen.
    pub ready: bool,
}

/// Which channel (if any) currently supplies database credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum DatabaseIntegration {
    #[default]
    Unset,
    Legacy(LegacyState),
    Standard(StandardState),
}

/// A relation event delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationEvent {
    /// Legacy relation data changed. Fields hold raw descriptors.
    LegacyChanged {
        primary: Option<String>,
        standbys: Option<String>,
    },
    /// Standard relation data changed.
    StandardChanged {
        username: String,
        password: String,
        endpoints: String,
        database: Option<String>,
    },
    /// A relation on the given channel was removed.
    Departed(Channel),
}

impl RelationEvent {
    /// Build a changed event from raw relation data.
    pub fn changed(channel: Channel, data: &BTreeMap<String, String>) -> Self {
        let field = |key: &str| data.get(key).cloned().filter(|v| !v.is_empty());
        match channel {
            Channel::Legacy => RelationEvent::LegacyChanged {
                primary: field("master"),
                standbys: field("standbys"),
            },
            Channel::Standard => RelationEvent::StandardChanged {
                username: field("username").unwrap_or_default(),
                password: field("password").unwrap_or_default(),
                endpoints: field("endpoints").unwrap_or_default(),
                database: field("database"),
            },
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            RelationEvent::LegacyChanged { .. } => Channel::Legacy,
            RelationEvent::StandardChanged { .. } => Channel::Standard,
            RelationEvent::Departed(channel) => *channel,
        }
    }
}

/// Outcome of applying an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: DatabaseIntegration,
    /// New connection string to persist, if the event resolved one.
    pub connection_string: Option<String>,
}

impl DatabaseIntegration {
    pub fn active_channel(&self) -> Option<Channel> {
        match self {
            DatabaseIntegration::Unset => None,
            DatabaseIntegration::Legacy(_) => Some(Channel::Legacy),
            DatabaseIntegration::Standard(_) => Some(Channel::Standard),
        }
    }

    /// Validate and apply a relation event.
    ///
    /// An event on the opposite channel of an active integration fails
    /// with [`RelationError::ConflictingIntegration`]; `self` is left as is.
    pub fn apply(&self, event: &RelationEvent) -> RelationResult<Transition> {
        if let RelationEvent::Departed(channel) = event {
            return Ok(self.depart(*channel));
        }

        let incoming = event.channel();
        if let Some(active) = self.active_channel() {
            if active != incoming {
                warn!(%active, %incoming, "rejecting second database integration");
                return Err(RelationError::ConflictingIntegration { active });
            }
        }

        match event {
            RelationEvent::LegacyChanged { primary, standbys } => {
                let previous = match self {
                    DatabaseIntegration::Legacy(state) => state.clone(),
                    _ => LegacyState::default(),
                };
                Ok(apply_legacy(previous, primary.as_deref(), standbys.as_deref()))
            }
            RelationEvent::StandardChanged {
                username,
                password,
                endpoints,
                database,
            } => {
                let previous = match self {
                    DatabaseIntegration::Standard(state) => state.clone(),
                    _ => StandardState::default(),
                };
                apply_standard(previous, username, password, endpoints, database.as_deref())
            }
            RelationEvent::Departed(_) => Ok(self.depart(incoming)),
        }
    }

    fn depart(&self, channel: Channel) -> Transition {
        let next = if self.active_channel() == Some(channel) {
            info!(%channel, "database integration departed");
            DatabaseIntegration::Unset
        } else {
            self.clone()
        };
        Transition {
            next,
            connection_string: None,
        }
    }
}

fn apply_legacy(
    mut state: LegacyState,
    primary: Option<&str>,
    standbys: Option<&str>,
) -> Transition {
    if let Some(raw) = standbys {
        match ConnectionDescriptor::parse_list(raw) {
            Ok(list) => {
                debug!(count = list.len(), "legacy standbys updated");
                state.standbys = list;
            }
            Err(e) => warn!(error = %e, "ignoring unparseable legacy standbys"),
        }
    }

    let mut connection_string = None;
    if let Some(raw) = primary {
        match ConnectionDescriptor::parse(raw) {
            Ok(descriptor) => {
                match build_connection_string(
                    &descriptor.user,
                    &descriptor.password,
                    &descriptor.host,
                    descriptor.port,
                    &descriptor.dbname,
                ) {
                    Ok(dsn) => {
                        info!(host = %descriptor.host, "legacy primary resolved");
                        connection_string = Some(dsn);
                        state.primary = Some(descriptor);
                    }
                    Err(e) => warn!(error = %e, "legacy primary has an unusable endpoint"),
                }
            }
            Err(e) => warn!(error = %e, "ignoring unparseable legacy primary"),
        }
    }

    Transition {
        next: DatabaseIntegration::Legacy(state),
        connection_string,
    }
}

fn apply_standard(
    mut state: StandardState,
    username: &str,
    password: &str,
    endpoints: &str,
    database: Option<&str>,
) -> RelationResult<Transition> {
    if username.is_empty() || password.is_empty() {
        debug!("standard integration not ready: credentials incomplete");
        return Ok(Transition {
            next: DatabaseIntegration::Standard(state),
            connection_string: None,
        });
    }

    let hosts: Vec<String> = endpoints
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect();
    let Some(host) = hosts.first() else {
        debug!("standard integration not ready: no endpoints");
        return Ok(Transition {
            next: DatabaseIntegration::Standard(state),
            connection_string: None,
        });
    };

    let database = database.unwrap_or(DEFAULT_DATABASE_NAME);
    let dsn = build_connection_string(username, password, host, None, database)?;
    info!(%host, %database, "standard integration resolved");

    state.username = username.to_string();
    state.database = database.to_string();
    state.endpoints = hosts;
    state.ready = true;

    Ok(Transition {
        next: DatabaseIntegration::Standard(state),
        connection_string: Some(dsn),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard(username: &str, password: &str, endpoints: &str) -> RelationEvent {
        RelationEvent::StandardChanged {
            username: username.into(),
            password: password.into(),
            endpoints: endpoints.into(),
            database: None,
        }
    }

    fn legacy(primary: Option<&str>, standbys: Option<&str>) -> RelationEvent {
        RelationEvent::LegacyChanged {
            primary: primary.map(Into::into),
            standbys: standbys.map(Into::into),
        }
    }

    #[test]
    fn standard_uses_first_endpoint() {
        let t = DatabaseIntegration::Unset
            .apply(&standard("u", "p", "h1,h2"))
            .unwrap();
        assert_eq!(t.connection_string.as_deref(), Some("postgresql://u:p@h1/livepatch-server"));
        assert_eq!(t.next.active_channel(), Some(Channel::Standard));
    }

    #[test]
    fn standard_incomplete_credentials_suppress_update() {
        let t = DatabaseIntegration::Unset.apply(&standard("", "", "h")).unwrap();
        assert!(t.connection_string.is_none());
        // The channel is claimed even though it is not ready yet.
        assert_eq!(t.next.active_channel(), Some(Channel::Standard));

        let ready = t.next.apply(&standard("u", "p", "h")).unwrap().next;
        let t = ready.apply(&standard("u", "", "h")).unwrap();
        assert!(t.connection_string.is_none());
        assert_eq!(t.next, ready);
    }

    #[test]
    fn standard_honours_database_field() {
        let event = RelationEvent::StandardChanged {
            username: "u".into(),
            password: "p".into(),
            endpoints: "h".into(),
            database: Some("other".into()),
        };
        let t = DatabaseIntegration::Unset.apply(&event).unwrap();
        assert_eq!(t.connection_string.as_deref(), Some("postgresql://u:p@h/other"));
    }

    #[test]
    fn legacy_primary_resolves() {
        let t = DatabaseIntegration::Unset
            .apply(&legacy(Some("host=h port=5432 dbname=d user=u password=p"), None))
            .unwrap();
        assert_eq!(t.connection_string.as_deref(), Some("postgresql://u:p@h:5432/d"));
    }

    #[test]
    fn legacy_standbys_tracked_but_unused() {
        let t = DatabaseIntegration::Unset
            .apply(&legacy(
                None,
                Some("host=standby-host port=5432 dbname=d user=u password=p"),
            ))
            .unwrap();
        assert!(t.connection_string.is_none());
        match &t.next {
            DatabaseIntegration::Legacy(state) => {
                assert!(state.primary.is_none());
                assert_eq!(state.standbys.len(), 1);
                assert_eq!(state.standbys[0].host, "standby-host");
            }
            other => panic!("expected legacy, got {other:?}"),
        }
    }

    #[test]
    fn legacy_then_standard_conflicts() {
        let state = DatabaseIntegration::Unset.apply(&legacy(None, None)).unwrap().next;
        let err = state.apply(&standard("u", "p", "h")).unwrap_err();
        assert_eq!(err, RelationError::ConflictingIntegration { active: Channel::Legacy });
        assert_eq!(
            err.to_string(),
            "Integration with both database relations is not allowed; `database-legacy` is already activated."
        );
    }

    #[test]
    fn standard_then_legacy_conflicts() {
        let state = DatabaseIntegration::Unset
            .apply(&standard("u", "p", "h"))
            .unwrap()
            .next;
        let err = state
            .apply(&legacy(Some("host=h dbname=d user=u password=p"), None))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Integration with both database relations is not allowed; `database` is already activated."
        );
    }

    #[test]
    fn departure_frees_the_channel() {
        let state = DatabaseIntegration::Unset
            .apply(&standard("u", "p", "h"))
            .unwrap()
            .next;

        // Departing the inactive channel changes nothing.
        let t = state.apply(&RelationEvent::Departed(Channel::Legacy)).unwrap();
        assert_eq!(t.next, state);

        let t = state.apply(&RelationEvent::Departed(Channel::Standard)).unwrap();
        assert_eq!(t.next, DatabaseIntegration::Unset);
        assert!(t.connection_string.is_none());

        assert!(t.next.apply(&legacy(None, None)).is_ok());
    }

    #[test]
    fn changed_from_relation_data() {
        let data: BTreeMap<String, String> = [
            ("username", "u"),
            ("password", "p"),
            ("endpoints", "h1,h2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(
            RelationEvent::changed(Channel::Standard, &data),
            standard("u", "p", "h1,h2")
        );

        let data: BTreeMap<String, String> =
            [("master".to_string(), "host=h dbname=d user=u password=p".to_string())].into();
        assert_eq!(
            RelationEvent::changed(Channel::Legacy, &data),
            legacy(Some("host=h dbname=d user=u password=p"), None)
        );
    }

    #[test]
    fn integration_serializes_for_unit_records() {
        let state = DatabaseIntegration::Unset
            .apply(&standard("u", "p", "h"))
            .unwrap()
            .next;
        let json = serde_json::to_string(&state).unwrap();
        let back: DatabaseIntegration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
