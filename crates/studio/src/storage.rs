//! Durable key-value state: access grant, stored credential, history.
//!
//! [`JsonFileStore`] keeps every slot in a single `state.json` under the
//! configured state path and writes through on every change.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;

use vr_domain::error::{Error, Result};

/// The fixed set of persisted slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    AccessGranted,
    Credential,
    History,
}

impl Slot {
    pub fn key(self) -> &'static str {
        match self {
            Self::AccessGranted => "access_granted",
            Self::Credential => "api_key",
            Self::History => "history",
        }
    }
}

/// Storage seam for the studio. Implementations must be safe to share.
pub trait StateStore: Send + Sync {
    fn read(&self, slot: Slot) -> Result<Option<Value>>;
    fn write(&self, slot: Slot, value: Value) -> Result<()>;
    fn erase(&self, slot: Slot) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<Slot, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn read(&self, slot: Slot) -> Result<Option<Value>> {
        Ok(self.slots.read().get(&slot).cloned())
    }

    fn write(&self, slot: Slot, value: Value) -> Result<()> {
        self.slots.write().insert(slot, value);
        Ok(())
    }

    fn erase(&self, slot: Slot) -> Result<()> {
        self.slots.write().remove(&slot);
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON file store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Store backed by `state_path/state.json`.
pub struct JsonFileStore {
    path: PathBuf,
    slots: RwLock<serde_json::Map<String, Value>>,
}

impl JsonFileStore {
    /// Load or create the store under `state_path`.
    ///
    /// A file that is not a JSON object is treated as empty and will be
    /// overwritten by the next write.
    pub fn new(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path).map_err(Error::Io)?;

        let path = state_path.join("state.json");
        let slots = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
            match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                _ => {
                    tracing::warn!(path = %path.display(), "state file unreadable, starting empty");
                    serde_json::Map::new()
                }
            }
        } else {
            serde_json::Map::new()
        };

        tracing::debug!(
            slots = slots.len(),
            path = %path.display(),
            "state store loaded"
        );

        Ok(Self {
            path,
            slots: RwLock::new(slots),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, slots: &serde_json::Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(slots)
            .map_err(|e| Error::Storage(format!("serializing state: {e}")))?;
        std::fs::write(&self.path, json).map_err(Error::Io)
    }
}

impl StateStore for JsonFileStore {
    fn read(&self, slot: Slot) -> Result<Option<Value>> {
        Ok(self.slots.read().get(slot.key()).cloned())
    }

    fn write(&self, slot: Slot, value: Value) -> Result<()> {
        let mut slots = self.slots.write();
        slots.insert(slot.key().to_string(), value);
        self.flush(&slots)
    }

    fn erase(&self, slot: Slot) -> Result<()> {
        let mut slots = self.slots.write();
        if slots.remove(slot.key()).is_some() {
            self.flush(&slots)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.read(Slot::Credential).unwrap().is_none());
        store.write(Slot::Credential, json!("AIza-test")).unwrap();
        assert_eq!(store.read(Slot::Credential).unwrap(), Some(json!("AIza-test")));
        store.erase(Slot::Credential).unwrap();
        assert!(store.read(Slot::Credential).unwrap().is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::new(dir.path()).unwrap();
            store.write(Slot::AccessGranted, json!(true)).unwrap();
            store.write(Slot::History, json!([])).unwrap();
        }

        let store = JsonFileStore::new(dir.path()).unwrap();
        assert_eq!(store.read(Slot::AccessGranted).unwrap(), Some(json!(true)));
        assert_eq!(store.read(Slot::History).unwrap(), Some(json!([])));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"access_granted\""));
    }

    #[test]
    fn file_store_recovers_from_garbage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state.json"), "not json").unwrap();

        let store = JsonFileStore::new(dir.path()).unwrap();
        assert!(store.read(Slot::History).unwrap().is_none());
        store.write(Slot::Credential, json!("k")).unwrap();
        assert_eq!(store.read(Slot::Credential).unwrap(), Some(json!("k")));
    }

    #[test]
    fn state_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = JsonFileStore::new(&nested).unwrap();
        store.write(Slot::AccessGranted, json!(true)).unwrap();
        assert!(nested.join("state.json").exists());
    }
}
