//! YAML file store
//!
//! Keeps all slots in one small YAML map. Every write rewrites the whole file
//! and resets its mode to 600 on Unix.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{CredentialStore, Slot};
use crate::error::StoreError;

type Result<T> = std::result::Result<T, StoreError>;

/// File-backed credential store
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            guard: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&contents).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn persist(&self, slots: &BTreeMap<String, String>) -> Result<()> {
        if slots.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(slots).map_err(|e| StoreError::Io(e.to_string()))?;
        std::fs::write(&self.path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| StoreError::Io("file store lock poisoned".to_string()))?;
        let mut slots = match self.load() {
            Ok(slots) => slots,
            Err(StoreError::Corrupt(e)) => {
                log::warn!("Discarding corrupt session file {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        f(&mut slots);
        self.persist(&slots)
    }
}

impl CredentialStore for FileStore {
    fn read(&self, slot: Slot) -> Result<Option<String>> {
        Ok(self.load()?.remove(slot.key()))
    }

    fn write(&self, slot: Slot, value: &str) -> Result<()> {
        self.update(|slots| {
            slots.insert(slot.key().to_string(), value.to_string());
        })
    }

    fn remove(&self, slot: Slot) -> Result<()> {
        self.update(|slots| {
            slots.remove(slot.key());
        })
    }
}
