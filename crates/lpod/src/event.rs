//! Lifecycle events delivered by the host runtime.

use std::collections::BTreeMap;
use std::fmt;

use lpo_relations::Channel;

use crate::error::{OperatorError, OperatorResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    WorkloadReady,
    AdminReady,
    ConfigChanged,
    Start,
    Stop,
    UpdateStatus,
    LeaderElected,
    UpgradeCharm,
    RelationChanged {
        channel: Channel,
        data: BTreeMap<String, String>,
    },
    RelationDeparted {
        channel: Channel,
    },
}

impl Event {
    /// Build an event from its name.
    ///
    /// Relation events need a channel; `data` is ignored by every other
    /// event.
    pub fn parse(
        name: &str,
        channel: Option<Channel>,
        data: BTreeMap<String, String>,
    ) -> OperatorResult<Self> {
        let need_channel =
            || channel.ok_or_else(|| OperatorError::MissingChannel(name.to_string()));
        let event = match name {
            "workload-ready" => Event::WorkloadReady,
            "admin-ready" => Event::AdminReady,
            "config-changed" => Event::ConfigChanged,
            "start" => Event::Start,
            "stop" => Event::Stop,
            "update-status" => Event::UpdateStatus,
            "leader-elected" => Event::LeaderElected,
            "upgrade-charm" => Event::UpgradeCharm,
            "relation-changed" => Event::RelationChanged {
                channel: need_channel()?,
                data,
            },
            "relation-departed" => Event::RelationDeparted {
                channel: need_channel()?,
            },
            other => return Err(OperatorError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::WorkloadReady => "workload-ready",
            Event::AdminReady => "admin-ready",
            Event::ConfigChanged => "config-changed",
            Event::Start => "start",
            Event::Stop => "stop",
            Event::UpdateStatus => "update-status",
            Event::LeaderElected => "leader-elected",
            Event::UpgradeCharm => "upgrade-charm",
            Event::RelationChanged { .. } => "relation-changed",
            Event::RelationDeparted { .. } => "relation-departed",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
