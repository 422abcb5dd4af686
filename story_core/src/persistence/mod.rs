//! Local key-value persistence.
//!
//! Writes happen immediately after every mutation. A failed write is
//! logged and otherwise ignored; gameplay never depends on it.

mod local_profile;
mod profile;

pub use local_profile::*;
pub use profile::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::StoreError;

/// Well-known storage keys.
pub mod keys {
    pub const CHARACTER_DATA: &str = "character_data";
    pub const SETTINGS: &str = "settings";
    pub const SCORE: &str = "score";
    pub const MUTED: &str = "muted";
    pub const DARK_MODE: &str = "dark_mode";
    pub const PROGRESS: &str = "progress";
    pub const UID: &str = "uid";
    pub const PLAY_TIME_PREFIX: &str = "play_time:";

    /// Key holding the minutes played on a calendar date.
    pub fn play_time(date: chrono::NaiveDate) -> String {
        format!("{}{}", PLAY_TIME_PREFIX, date.format("%Y-%m-%d"))
    }
}

/// String key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read a JSON value. Missing keys are `Ok(None)`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Write a JSON value.
pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Write a JSON value, logging instead of returning failures.
pub fn save_json_logged<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    match save_json(store, key, value) {
        Ok(()) => true,
        Err(e) => {
            warn!(key, error = %e, "Failed to persist value");
            false
        }
    }
}

/// Read a JSON value, falling back to `None` on any failure.
pub fn load_json_logged<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match load_json(store, key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Failed to load stored value");
            None
        }
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON document on disk.
///
/// The whole document is rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open a store, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            entries: RefCell::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&*self.entries.borrow())?;
        std::fs::write(&self.path, raw).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        self.flush()
    }
}

/// Storage whose every operation fails.
#[cfg(test)]
pub struct FailingStore;

#[cfg(test)]
impl FailingStore {
    fn error() -> StoreError {
        StoreError::Io {
            path: PathBuf::from("/unavailable"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        }
    }
}

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(Self::error())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(Self::error())
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(Self::error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set(keys::MUTED, "true").unwrap();
        assert_eq!(store.get(keys::MUTED).unwrap().as_deref(), Some("true"));

        store.remove(keys::MUTED).unwrap();
        assert!(store.get(keys::MUTED).unwrap().is_none());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storybook.json");

        {
            let store = FileStore::open(&path).unwrap();
            save_json(&store, keys::SCORE, &42u32).unwrap();
            store.set(keys::DARK_MODE, "true").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        let score: Option<u32> = load_json(&reopened, keys::SCORE).unwrap();
        assert_eq!(score, Some(42));
        assert_eq!(reopened.get(keys::DARK_MODE).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_logged_helpers_swallow_failures() {
        assert!(!save_json_logged(&FailingStore, keys::SCORE, &1u32));
        assert!(load_json_logged::<u32>(&FailingStore, keys::SCORE).is_none());
    }

    #[test]
    fn test_play_time_key() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        assert_eq!(keys::play_time(date), "play_time:2024-07-04");
    }
}
