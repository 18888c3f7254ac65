//! SQLite-backed local store.
//!
//! Everything lives in one `kv` table:
//! - `{uid}/challenges`: JSON array of challenges
//! - `{uid}/active_id`: remembered active challenge id
//! - `tracker_state`, `habits`: legacy keys, consumed once by migration
//! - `signed_in_uid`: local identity

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{data_dir, keys, migrations, ChallengeStore, ProfileState};
use crate::challenge::Challenge;
use crate::error::StoreError;
use crate::identity::Identity;

/// Database file name inside the data directory.
const DB_FILE: &str = "habitgrid.db";

/// SQLite database for challenges and profile state.
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open the database at `<data_dir>/habitgrid.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable {
            message: "data directory unavailable".to_string(),
            source: Some(Box::new(e)),
        })?;
        Self::open_at(&dir.join(DB_FILE))
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::unavailable("local store lock poisoned"))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        read_value(&conn, key)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        write_value(&conn, key, value)
    }

    /// Delete a key. Missing keys are ignored.
    pub fn kv_delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Read-modify-write the collection of `uid` inside one transaction.
    fn update_collection<F>(&self, uid: &str, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Challenge>),
    {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let key = keys::collection(uid);
        let mut challenges = decode_collection(&key, read_value(&tx, &key)?)?;
        update(&mut challenges);
        let json = serde_json::to_string(&challenges).map_err(|e| StoreError::malformed(&key, e))?;
        write_value(&tx, &key, &json)?;
        tx.commit()?;
        Ok(())
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get::<_, String>(0)
        })
        .optional()?;
    Ok(value)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
        params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn decode_collection(key: &str, raw: Option<String>) -> Result<Vec<Challenge>, StoreError> {
    match raw {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::malformed(key, e)),
        None => Ok(Vec::new()),
    }
}

impl ChallengeStore for LocalStore {
    async fn list(&self, identity: &Identity) -> Result<Vec<Challenge>, StoreError> {
        let key = keys::collection(&identity.uid);
        let challenges = decode_collection(&key, self.kv_get(&key)?)?;
        tracing::debug!(uid = %identity.uid, count = challenges.len(), "listed local challenges");
        Ok(challenges)
    }

    async fn save(&self, identity: &Identity, challenge: &Challenge) -> Result<(), StoreError> {
        self.update_collection(&identity.uid, |challenges| {
            match challenges.iter_mut().find(|c| c.id == challenge.id) {
                Some(existing) => *existing = challenge.clone(),
                None => challenges.push(challenge.clone()),
            }
        })?;
        tracing::debug!(uid = %identity.uid, challenge = %challenge.id, "saved challenge locally");
        Ok(())
    }

    async fn delete(&self, identity: &Identity, challenge_id: &str) -> Result<(), StoreError> {
        self.update_collection(&identity.uid, |challenges| {
            challenges.retain(|c| c.id != challenge_id);
        })?;
        tracing::debug!(uid = %identity.uid, challenge = %challenge_id, "deleted local challenge");
        Ok(())
    }
}

impl ProfileState for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.kv_get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.kv_set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.kv_delete(key)
    }
}
