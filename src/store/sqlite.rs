//! SQLite-backed credential store

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{CredentialStore, Slot};
use crate::error::StoreError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

type Result<T> = std::result::Result<T, StoreError>;

/// SQLite credential store, one row per slot
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database file at `path`
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("Failed to create store dir: {}", e)))?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Session store schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            conn.execute_batch("DROP TABLE IF EXISTS session_slots;")?;
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session_slots (
                slot TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }
}

impl CredentialStore for SqliteStore {
    fn read(&self, slot: Slot) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM session_slots WHERE slot = ?1",
                [slot.key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, slot: Slot, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO session_slots (slot, value, updated_at)
             VALUES (?1, ?2, ?3)",
            params![slot.key(), value, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&self, slot: Slot) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM session_slots WHERE slot = ?1", [slot.key()])?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM session_slots", [])?;
        Ok(())
    }
}
