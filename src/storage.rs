//! Durable client-side storage behind a trait so the persistence layer can
//! be swapped or mocked in tests. Two independent slots: the live cart and
//! the auth-redirect backup. Last write wins when several processes share a
//! slot; there is no locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::EngineResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSlot {
    Cart,
    Backup,
}

impl StorageSlot {
    /// Fixed namespace key for the slot.
    pub fn key(self) -> &'static str {
        match self {
            StorageSlot::Cart => "storefront.cart",
            StorageSlot::Backup => "storefront.cart.backup",
        }
    }
}

pub trait CartStorage: Send + Sync {
    fn load(&self, slot: StorageSlot) -> EngineResult<Option<String>>;
    fn save(&self, slot: StorageSlot, payload: &str) -> EngineResult<()>;
    fn remove(&self, slot: StorageSlot) -> EngineResult<()>;
}

/// Default adapter: one JSON file per slot under a base directory.
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl AsRef<Path>) -> EngineResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, slot: StorageSlot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self, slot: StorageSlot) -> EngineResult<Option<String>> {
        match std::fs::read_to_string(self.path(slot)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, slot: StorageSlot, payload: &str) -> EngineResult<()> {
        std::fs::write(self.path(slot), payload)?;
        Ok(())
    }

    fn remove(&self, slot: StorageSlot) -> EngineResult<()> {
        match std::fs::remove_file(self.path(slot)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory adapter used by tests and embedders without a filesystem.
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<&'static str, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, slot: StorageSlot) -> EngineResult<Option<String>> {
        Ok(self.slots.lock().unwrap().get(slot.key()).cloned())
    }

    fn save(&self, slot: StorageSlot, payload: &str) -> EngineResult<()> {
        self.slots
            .lock()
            .unwrap()
            .insert(slot.key(), payload.to_string());
        Ok(())
    }

    fn remove(&self, slot: StorageSlot) -> EngineResult<()> {
        self.slots.lock().unwrap().remove(slot.key());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_storage_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path()).unwrap();

        assert!(storage.load(StorageSlot::Cart).unwrap().is_none());
        storage.save(StorageSlot::Cart, "{\"items\":[]}").unwrap();
        assert_eq!(
            storage.load(StorageSlot::Cart).unwrap().as_deref(),
            Some("{\"items\":[]}")
        );

        // Slots are independent.
        assert!(storage.load(StorageSlot::Backup).unwrap().is_none());

        storage.remove(StorageSlot::Cart).unwrap();
        assert!(storage.load(StorageSlot::Cart).unwrap().is_none());
        // Removing an absent slot is a no-op.
        storage.remove(StorageSlot::Cart).unwrap();
    }

    #[test]
    fn memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        storage.save(StorageSlot::Backup, "[]").unwrap();
        assert_eq!(
            storage.load(StorageSlot::Backup).unwrap().as_deref(),
            Some("[]")
        );
        storage.remove(StorageSlot::Backup).unwrap();
        assert!(storage.load(StorageSlot::Backup).unwrap().is_none());
    }
}
