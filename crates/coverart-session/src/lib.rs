//! Editing session for coverart documents: undo history, snapshots,
//! clipboard, selection, and debounced persistence to a key-value store.

pub mod autosave;
pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod snapshots;
pub mod storage;

pub use autosave::Debouncer;
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult, StorageError};
pub use history::{HistoryEntry, HistoryStack};
pub use session::{DOCUMENT_KEY, EditorSession, MIN_ELEMENT_SIZE, StorageStatus};
pub use snapshots::{SNAPSHOTS_KEY, SnapshotStore};
pub use storage::{DEFAULT_QUOTA_BYTES, FileStore, KeyValueStore, MemoryStore, default_data_dir};
