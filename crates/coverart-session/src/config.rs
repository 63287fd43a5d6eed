//! Tunables for an editor session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::autosave::DEFAULT_AUTOSAVE_DELAY_MS;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::snapshots::DEFAULT_SNAPSHOT_LIMIT;

/// Offset (percent) applied to pasted and duplicated elements
pub const DEFAULT_PASTE_OFFSET: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum undo entries kept
    pub history_limit: usize,
    /// Maximum snapshots kept (newest win)
    pub snapshot_limit: usize,
    /// Quiet period after the last edit before the document is written
    pub autosave_delay_ms: u64,
    pub paste_offset: f64,
}

impl SessionConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            paste_offset: DEFAULT_PASTE_OFFSET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"snapshot_limit": 3}"#).unwrap();
        assert_eq!(config.snapshot_limit, 3);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.autosave_delay(), Duration::from_secs(1));
    }
}
