//! Domain types for the operator state store.

use serde::{Deserialize, Serialize};

/// Whether this replica currently holds leadership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leadership {
    Leader,
    Follower,
}

impl Leadership {
    pub fn from_flag(is_leader: bool) -> Self {
        if is_leader {
            Leadership::Leader
        } else {
            Leadership::Follower
        }
    }

    pub fn is_leader(&self) -> bool {
        matches!(self, Leadership::Leader)
    }
}

/// Keys of the shared `peer` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerKey {
    ConnectionString,
    ResourceToken,
}

impl PeerKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerKey::ConnectionString => "dsn",
            PeerKey::ResourceToken => "resource_token",
        }
    }
}

/// Snapshot of the shared state visible to every replica.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentState {
    /// Resolved database connection string.
    pub connection_string: Option<String>,
    /// Token issued by the contracts service for patch sync.
    pub resource_token: Option<String>,
}

impl PersistentState {
    /// The connection string, if one has been resolved to a non-empty value.
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string.as_deref().filter(|s| !s.is_empty())
    }

    pub fn resource_token(&self) -> Option<&str> {
        self.resource_token.as_deref().filter(|s| !s.is_empty())
    }
}
