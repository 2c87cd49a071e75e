//! Persistence for the updater configuration
//!
//! The config lives as a single pretty-printed JSON file in the user data
//! directory and is rewritten whole on every mutation. Reads are permissive:
//! a missing or unreadable file falls back to defaults so a corrupt config
//! can never keep the client from starting.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HwDesktopError, Result};
use crate::models::UpdateConfig;

const CONFIG_FILE: &str = "update-config.json";

/// Name of the app directory created under the platform data dir
const APP_DIR: &str = "hw-desktop";

/// Handle to the on-disk config file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, falling back to defaults on any failure
    pub fn load(&self) -> UpdateConfig {
        if !self.path.exists() {
            return UpdateConfig::default();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read update config, using defaults: {}", e);
                return UpdateConfig::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse update config, using defaults: {}", e);
                UpdateConfig::default()
            }
        }
    }

    /// Write the config back to disk, creating the directory if needed
    pub fn save(&self, config: &UpdateConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// User data directory for the desktop client, created on first use
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        HwDesktopError::Config("Could not determine the user data directory".to_string())
    })?;
    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
