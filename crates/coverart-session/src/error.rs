//! Error types for the session crate.

use coverart_core::{CoreError, ElementId, SnapshotId};
use thiserror::Error;

/// Failures of the durable key-value store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The write would exceed the store's size limit.
    #[error("storage limit reached writing '{key}' ({size} bytes, limit {limit} bytes)")]
    QuotaExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures surfaced by editor session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Import text could not be parsed or migrated; the document is unchanged.
    #[error("invalid configuration file: {0}")]
    ImportInvalid(#[source] CoreError),

    /// Snapshot data could not be migrated; the document is unchanged.
    #[error("failed to restore snapshot {id}: {source}")]
    RestoreFailed {
        id: SnapshotId,
        #[source]
        source: CoreError,
    },

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),

    #[error("element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("layer index {index} out of range ({len} elements)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type SessionResult<T> = Result<T, SessionError>;
