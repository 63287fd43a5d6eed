//! Named revisions of the document, newest first.
//!
//! Each snapshot owns a deep copy of the document taken at capture time, so
//! later edits never reach it. The list is written as a whole under
//! [`SNAPSHOTS_KEY`] whenever it changes.

use coverart_core::{Document, Snapshot, SnapshotId, normalize, now_millis};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// Maximum snapshots kept by default
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 8;

/// Storage key for the snapshot list
pub const SNAPSHOTS_KEY: &str = "coverart_snapshots_v7";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Newest first
    snapshots: Vec<Snapshot>,
    limit: usize,
}

impl SnapshotStore {
    pub fn new(limit: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            limit,
        }
    }

    /// Load the persisted list. Entries whose data cannot be migrated are skipped.
    pub fn load(store: &dyn KeyValueStore, limit: usize) -> Result<Self, StorageError> {
        let mut snapshots = Vec::new();
        if let Some(text) = store.get(SNAPSHOTS_KEY)? {
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Array(entries)) => {
                    for (index, entry) in entries.iter().enumerate() {
                        match snapshot_from_value(entry) {
                            Some(snapshot) => snapshots.push(snapshot),
                            None => warn!(index, "Skipping unreadable snapshot"),
                        }
                    }
                }
                Ok(_) => warn!("Stored snapshot list is not an array, ignoring it"),
                Err(e) => warn!(error = %e, "Stored snapshot list is not valid JSON, ignoring it"),
            }
        }
        snapshots.truncate(limit);
        debug!(count = snapshots.len(), "Loaded snapshots");
        Ok(Self { snapshots, limit })
    }

    /// Write the whole list.
    pub fn persist(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        let text = serde_json::to_string(&self.snapshots)?;
        store.set(SNAPSHOTS_KEY, &text)
    }

    /// Record a copy of `doc` as the newest snapshot, dropping the oldest past the limit.
    pub fn capture(&mut self, doc: &Document, thumbnail: Option<String>) -> &Snapshot {
        let snapshot = Snapshot {
            id: SnapshotId::new(),
            name: format!("Revision {}", self.snapshots.len() + 1),
            timestamp: now_millis(),
            data: doc.clone(),
            thumbnail,
        };
        debug!(id = %snapshot.id, name = %snapshot.name, "Captured snapshot");
        self.snapshots.insert(0, snapshot);
        self.snapshots.truncate(self.limit);
        &self.snapshots[0]
    }

    pub fn remove(&mut self, id: &SnapshotId) -> bool {
        let before = self.snapshots.len();
        self.snapshots.retain(|s| &s.id != id);
        self.snapshots.len() != before
    }

    pub fn rename(&mut self, id: &SnapshotId, name: impl Into<String>) -> bool {
        match self.snapshots.iter_mut().find(|s| &s.id == id) {
            Some(snapshot) => {
                snapshot.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &SnapshotId) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| &s.id == id)
    }

    /// Newest first
    pub fn list(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_LIMIT)
    }
}

/// Read a stored entry, migrating its document. Older builds wrote numeric ids.
fn snapshot_from_value(value: &Value) -> Option<Snapshot> {
    let obj = value.as_object()?;
    let data = normalize(obj.get("data")?).ok()?;
    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => SnapshotId::from(s.as_str()),
        Some(Value::Number(n)) => SnapshotId::from(n.to_string()),
        _ => SnapshotId::new(),
    };
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| data.name.clone());
    let timestamp = obj
        .get("timestamp")
        .and_then(Value::as_f64)
        .map(|t| t as i64)
        .unwrap_or(data.last_modified);
    let thumbnail = obj
        .get("thumbnail")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    Some(Snapshot {
        id,
        name,
        timestamp,
        data,
        thumbnail,
    })
}
