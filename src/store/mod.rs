//! Durable storage for the session slots
//!
//! The store is a plain key/value surface with no expiry semantics. It holds
//! three named slots; a missing key means an absent value. Values are strings:
//! the identity slot carries JSON, the credential slots carry raw tokens.

pub mod file;
pub mod sqlite;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, StoreError};

pub use file::FileStore;
pub use sqlite::SqliteStore;

/// The three persisted session slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Identity snapshot (JSON)
    Identity,
    /// Short-lived access credential
    Access,
    /// Long-lived renewal credential
    Renewal,
}

impl Slot {
    /// All slots, in the order they are cleared
    pub const ALL: [Slot; 3] = [Slot::Identity, Slot::Access, Slot::Renewal];

    /// Storage key for the slot
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Identity => "user",
            Slot::Access => "accessToken",
            Slot::Renewal => "refreshToken",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Key/value persistence for session slots.
///
/// Implementations give no partial-write guarantees across slots; callers
/// write slots one at a time.
pub trait CredentialStore: Send + Sync {
    /// Read a slot, `None` when absent
    fn read(&self, slot: Slot) -> std::result::Result<Option<String>, StoreError>;

    /// Overwrite a slot
    fn write(&self, slot: Slot, value: &str) -> std::result::Result<(), StoreError>;

    /// Remove a slot; removing an absent slot is not an error
    fn remove(&self, slot: Slot) -> std::result::Result<(), StoreError>;

    /// Remove every slot
    fn clear(&self) -> std::result::Result<(), StoreError> {
        for slot in Slot::ALL {
            self.remove(slot)?;
        }
        Ok(())
    }
}

/// Available store backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// YAML file with owner-only permissions
    #[default]
    File,
    /// SQLite database
    Sqlite,
    /// Process memory only, nothing survives a restart
    Memory,
}

/// Open the store selected by the configuration
pub fn open(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match config.store {
        StoreBackend::File => Arc::new(FileStore::new(config.store_location()?)),
        StoreBackend::Sqlite => Arc::new(SqliteStore::open_at(&config.store_location()?)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<Slot, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> std::result::Result<std::sync::MutexGuard<'_, HashMap<Slot, String>>, StoreError> {
        self.slots
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))
    }
}

impl CredentialStore for MemoryStore {
    fn read(&self, slot: Slot) -> std::result::Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(&slot).cloned())
    }

    fn write(&self, slot: Slot, value: &str) -> std::result::Result<(), StoreError> {
        self.lock()?.insert(slot, value.to_string());
        Ok(())
    }

    fn remove(&self, slot: Slot) -> std::result::Result<(), StoreError> {
        self.lock()?.remove(&slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_keys() {
        assert_eq!(Slot::Identity.key(), "user");
        assert_eq!(Slot::Access.key(), "accessToken");
        assert_eq!(Slot::Renewal.key(), "refreshToken");
        assert_eq!(Slot::Renewal.to_string(), "refreshToken");
    }

    #[test]
    fn test_memory_store_read_write_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.read(Slot::Access).unwrap(), None);

        store.write(Slot::Access, "tok-1").unwrap();
        store.write(Slot::Access, "tok-2").unwrap();
        assert_eq!(store.read(Slot::Access).unwrap().as_deref(), Some("tok-2"));

        store.remove(Slot::Access).unwrap();
        assert_eq!(store.read(Slot::Access).unwrap(), None);

        // Removing again is fine
        store.remove(Slot::Access).unwrap();
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemoryStore::new();
        store.write(Slot::Identity, "{}").unwrap();
        store.write(Slot::Access, "a").unwrap();
        store.write(Slot::Renewal, "r").unwrap();

        store.clear().unwrap();

        for slot in Slot::ALL {
            assert_eq!(store.read(slot).unwrap(), None);
        }
    }

    #[test]
    fn test_backend_serde_names() {
        let backend: StoreBackend = serde_yaml::from_str("sqlite").unwrap();
        assert_eq!(backend, StoreBackend::Sqlite);
        assert_eq!(serde_yaml::to_string(&StoreBackend::Memory).unwrap().trim(), "memory");
    }

    #[test]
    fn test_open_memory_backend() {
        let config = Config {
            store: StoreBackend::Memory,
            ..Config::default()
        };
        let store = open(&config).unwrap();
        store.write(Slot::Renewal, "r").unwrap();
        assert_eq!(store.read(Slot::Renewal).unwrap().as_deref(), Some("r"));
    }
}
