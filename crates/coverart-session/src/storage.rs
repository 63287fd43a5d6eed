//! Durable key-value storage for the current document and the snapshot list.
//!
//! Stores are size limited the way browser storage is: a write that would push
//! the total past the quota fails with [`StorageError::QuotaExceeded`] and
//! leaves the previous value in place.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::StorageError;

/// Default store quota, matching the usual 5 MiB browser limit
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Get the default data directory for persisted state
pub fn default_data_dir() -> PathBuf {
    // Use XDG data directory if available, otherwise fallback to ~/.local/share
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
    data_dir.join("coverart")
}

/// String key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

fn check_quota(key: &str, total: usize, quota: Option<usize>) -> Result<(), StorageError> {
    match quota {
        Some(limit) if total > limit => {
            warn!(key, size = total, limit, "Storage limit reached");
            Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                size: total,
                limit,
            })
        }
        _ => Ok(()),
    }
}

/// In-memory store; the quota counts key and value bytes across all entries.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    fn used_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let total = self.used_excluding(key) + key.len() + value.len();
        check_quota(key, total, self.quota)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key (`<dir>/<key>.json`).
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota: Some(DEFAULT_QUOTA_BYTES),
        }
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Bytes used by every stored key other than `key`
    fn used_excluding(&self, key: &str) -> Result<usize, StorageError> {
        let skip = self.path_for(key);
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut used = 0usize;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path == skip || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            used += entry.metadata()?.len() as usize;
        }
        Ok(used)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.quota.is_some() {
            let total = self.used_excluding(key)? + value.len();
            check_quota(key, total, self.quota)?;
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        fs::write(&path, value)?;
        debug!(path = %path.display(), bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn memory_store_quota_keeps_previous_value() {
        let mut store = MemoryStore::with_quota(10);
        store.set("k", "small").unwrap();
        let err = store.set("k", "much too large").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn memory_store_quota_is_shared_across_keys() {
        let mut store = MemoryStore::with_quota(12);
        store.set("a", "12345").unwrap();
        // "b" + "123456" = 7 bytes, plus 6 already used
        assert!(store.set("b", "123456").is_err());
        assert!(store.set("b", "12345").is_ok());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.get("doc").unwrap(), None);
        store.set("doc", "{\"a\":1}").unwrap();
        assert_eq!(store.get("doc").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(dir.path().join("nested/doc.json").exists());
        store.remove("doc").unwrap();
        store.remove("doc").unwrap();
        assert_eq!(store.get("doc").unwrap(), None);
    }

    #[test]
    fn file_store_quota() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).with_quota(Some(8));
        store.set("a", "1234").unwrap();
        assert!(matches!(
            store.set("b", "12345"),
            Err(StorageError::QuotaExceeded { .. })
        ));
        // Overwriting a key does not count its old value
        store.set("a", "12345678").unwrap();
    }
}
