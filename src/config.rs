//! User configuration for coverart
//!
//! Read from `$XDG_CONFIG_HOME/coverart/config.json`. Every field is
//! optional; a missing or unreadable file gives the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use coverart_export::RasterOptions;
use coverart_session::{DEFAULT_QUOTA_BYTES, SessionConfig, default_data_dir};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history_limit: usize,
    pub snapshot_limit: usize,
    pub autosave_delay_ms: u64,
    /// `null` disables the storage limit
    pub storage_quota_bytes: Option<usize>,
    pub export_pixel_ratio: f64,
    pub thumbnail_pixel_ratio: f64,
    /// Where the document and snapshots are kept
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            history_limit: session.history_limit,
            snapshot_limit: session.snapshot_limit,
            autosave_delay_ms: session.autosave_delay_ms,
            storage_quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            export_pixel_ratio: RasterOptions::full().pixel_ratio,
            thumbnail_pixel_ratio: RasterOptions::thumbnail().pixel_ratio,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load from the default config path
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str(&content)?))
        {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            });
        config_dir.join("coverart").join("config.json")
    }

    /// Write the config, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            history_limit: self.history_limit,
            snapshot_limit: self.snapshot_limit,
            autosave_delay_ms: self.autosave_delay_ms,
            ..SessionConfig::default()
        }
    }

    pub fn export_options(&self) -> RasterOptions {
        RasterOptions {
            pixel_ratio: self.export_pixel_ratio,
        }
    }

    pub fn thumbnail_options(&self) -> RasterOptions {
        RasterOptions {
            pixel_ratio: self.thumbnail_pixel_ratio,
        }
    }
}
