//! Operator state on redb.
//!
//! The `peer` table holds the connection string and resource token that
//! every replica reads; writes go through a [`LeaderWriter`]. The `unit`
//! table holds this replica's JSON records (integration channel, last
//! status).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Wrap a redb error's message in the named `StateError` variant.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Handle to the operator database. Cheap to clone.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open the database at `path`, creating it and both tables if needed.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Database that lives only as long as the handle.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(PEER).map_err(map_err!(Table))?;
        txn.open_table(UNIT).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Shared state ───────────────────────────────────────────────

    /// Read the shared state. Any replica may read.
    pub fn persistent_state(&self) -> StateResult<PersistentState> {
        Ok(PersistentState {
            connection_string: self.get_peer(PeerKey::ConnectionString)?,
            resource_token: self.get_peer(PeerKey::ResourceToken)?,
        })
    }

    fn get_peer(&self, key: PeerKey) -> StateResult<Option<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PEER).map_err(map_err!(Table))?;
        let value = table
            .get(key.as_str())
            .map_err(map_err!(Read))?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    /// Obtain a writer for the shared state.
    ///
    /// Fails with [`StateError::NotLeader`] unless this replica leads.
    pub fn writer(&self, leadership: Leadership) -> StateResult<LeaderWriter<'_>> {
        if !leadership.is_leader() {
            warn!("refusing shared state write from non-leader replica");
            return Err(StateError::NotLeader);
        }
        Ok(LeaderWriter { store: self })
    }

    // ── Unit records ───────────────────────────────────────────────

    /// Insert or update a replica-local record.
    pub fn put_unit_record<T: Serialize>(&self, key: &str, record: &T) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(UNIT).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "unit record stored");
        Ok(())
    }

    /// Get a replica-local record.
    pub fn get_unit_record<T: DeserializeOwned>(&self, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(UNIT).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

/// Write handle for the shared state, only handed out to the leader.
pub struct LeaderWriter<'a> {
    store: &'a StateStore,
}

impl LeaderWriter<'_> {
    pub fn set_connection_string(&self, dsn: &str) -> StateResult<()> {
        self.put(PeerKey::ConnectionString, dsn)
    }

    pub fn set_resource_token(&self, token: &str) -> StateResult<()> {
        self.put(PeerKey::ResourceToken, token)
    }

    fn put(&self, key: PeerKey, value: &str) -> StateResult<()> {
        let txn = self.store.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PEER).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value)
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(key = key.as_str(), "shared value stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        channel: String,
        joined: bool,
    }

    #[test]
    fn empty_store_has_no_shared_state() {
        let store = StateStore::open_in_memory().unwrap();
        let state = store.persistent_state().unwrap();
        assert_eq!(state, PersistentState::default());
        assert!(state.connection_string().is_none());
    }

    #[test]
    fn leader_writes_are_visible() {
        let store = StateStore::open_in_memory().unwrap();
        let writer = store.writer(Leadership::Leader).unwrap();
        writer.set_connection_string("postgresql://u:p@h/db").unwrap();
        writer.set_resource_token("tok").unwrap();

        let state = store.persistent_state().unwrap();
        assert_eq!(state.connection_string(), Some("postgresql://u:p@h/db"));
        assert_eq!(state.resource_token(), Some("tok"));
    }

    #[test]
    fn follower_cannot_write() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store.writer(Leadership::Follower).err().unwrap();
        assert!(matches!(err, StateError::NotLeader));
        assert_eq!(err.to_string(), "unit is not the leader; shared state is read-only");
        assert!(store.persistent_state().unwrap().connection_string.is_none());
    }

    #[test]
    fn empty_connection_string_is_not_meaningful() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .writer(Leadership::Leader)
            .unwrap()
            .set_connection_string("")
            .unwrap();
        let state = store.persistent_state().unwrap();
        assert_eq!(state.connection_string.as_deref(), Some(""));
        assert!(state.connection_string().is_none());
    }

    #[test]
    fn unit_record_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let record = Record {
            channel: "database".to_string(),
            joined: true,
        };
        store.put_unit_record("integration", &record).unwrap();

        let back: Option<Record> = store.get_unit_record("integration").unwrap();
        assert_eq!(back, Some(record));

        let missing: Option<Record> = store.get_unit_record("nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("lpo.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store
                .writer(Leadership::Leader)
                .unwrap()
                .set_connection_string("postgresql://u:p@h/db")
                .unwrap();
        }

        let store = StateStore::open(&db_path).unwrap();
        assert_eq!(
            store.persistent_state().unwrap().connection_string(),
            Some("postgresql://u:p@h/db")
        );
    }
}
