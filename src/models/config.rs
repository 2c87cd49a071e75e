//! Persisted updater configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default update API base URL (portal deployments override this via settings)
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:10099/api/update";

/// Updater configuration, persisted as `update-config.json` in the
/// user data directory. Missing keys fall back to defaults and unknown
/// keys are ignored, so config files from older releases keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateConfig {
    /// Base URL of the update API
    pub server_url: String,
    /// Download new versions as soon as a check finds one
    pub auto_download: bool,
    /// Show a notification when an update is found and auto-download is off
    pub show_notification: bool,
    /// Time of the last completed check
    pub last_check: Option<DateTime<Utc>>,
    /// Minimum spacing between unforced checks, in hours
    pub check_interval: u32,
    /// Upper bound on retry waiting, in minutes (carried, not enforced)
    pub max_wait_minutes: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            auto_download: true,
            show_notification: true,
            last_check: None,
            check_interval: 24,
            max_wait_minutes: 120,
        }
    }
}

/// Partial config update applied by the `set_update_config` command.
/// Only the fields present in the payload are changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateConfigPatch {
    pub server_url: Option<String>,
    pub auto_download: Option<bool>,
    pub show_notification: Option<bool>,
    pub check_interval: Option<u32>,
    pub max_wait_minutes: Option<u32>,
}

impl UpdateConfigPatch {
    /// Apply this patch onto an existing config
    pub fn apply(&self, config: &mut UpdateConfig) {
        if let Some(server_url) = &self.server_url {
            config.server_url = server_url.clone();
        }
        if let Some(auto_download) = self.auto_download {
            config.auto_download = auto_download;
        }
        if let Some(show_notification) = self.show_notification {
            config.show_notification = show_notification;
        }
        if let Some(check_interval) = self.check_interval {
            config.check_interval = check_interval;
        }
        if let Some(max_wait_minutes) = self.max_wait_minutes {
            config.max_wait_minutes = max_wait_minutes;
        }
    }
}
