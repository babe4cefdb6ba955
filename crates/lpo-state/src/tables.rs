//! redb table definitions for the operator state store.

use redb::TableDefinition;

/// Shared, leader-written values keyed by [`crate::types::PeerKey`].
pub const PEER: TableDefinition<&str, &str> = TableDefinition::new("peer");

/// Replica-local JSON records keyed by name.
pub const UNIT: TableDefinition<&str, &[u8]> = TableDefinition::new("unit");
