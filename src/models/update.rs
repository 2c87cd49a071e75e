//! Data models for the auto-update subsystem

use serde::{Deserialize, Serialize};

/// Metadata of the latest known remote version, immutable once assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub release_notes: String,
    #[serde(default)]
    pub release_date: String,
    pub filename: String,
    /// Expected MD5 of the artifact; empty when the server has none recorded
    #[serde(default)]
    pub md5: String,
}

/// Snapshot of the updater state machine, pushed to the UI as a whole
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub checking: bool,
    pub available: bool,
    pub downloading: bool,
    pub downloaded: bool,
    pub error: Option<String>,
    /// Download completion percentage, 0..=100
    pub progress: u8,
    pub version_info: Option<VersionInfo>,
    pub download_path: Option<String>,
    pub force_update: bool,
}

/// Wire shape of `GET {serverUrl}/check_update` (fixed server contract)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUpdateResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub has_update: bool,
    #[serde(default)]
    pub latest_version: String,
    #[serde(default)]
    pub release_notes: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub md5: String,
    #[serde(default)]
    pub force_update: bool,
}

impl CheckUpdateResponse {
    /// Extract the version metadata carried by an update-available response
    pub fn version_info(&self) -> VersionInfo {
        VersionInfo {
            version: self.latest_version.clone(),
            release_notes: self.release_notes.clone(),
            release_date: self.release_date.clone(),
            filename: self.filename.clone(),
            md5: self.md5.clone(),
        }
    }
}

/// Result of a `check_for_updates` call, as returned over IPC
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checking: Option<bool>,
    pub has_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_info: Option<VersionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    /// A non-forced check observed one already in flight
    pub fn already_checking() -> Self {
        Self {
            checking: Some(true),
            ..Default::default()
        }
    }

    pub fn update_available(version_info: VersionInfo, force_update: bool) -> Self {
        Self {
            has_update: true,
            version_info: Some(version_info),
            force_update: Some(force_update),
            ..Default::default()
        }
    }

    pub fn no_update() -> Self {
        Self::default()
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Result of a `download_update` call, as returned over IPC
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloading: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadResult {
    /// A second call observed the transfer already in flight
    pub fn in_progress(progress: u8) -> Self {
        Self {
            downloading: Some(true),
            progress: Some(progress),
            ..Default::default()
        }
    }

    pub fn completed(download_path: impl Into<String>) -> Self {
        Self {
            success: true,
            downloaded: Some(true),
            download_path: Some(download_path.into()),
            ..Default::default()
        }
    }

    pub fn cancelled() -> Self {
        Self {
            error: Some("Download cancelled".to_string()),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Result of a `cancel_update` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CancelResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Result of an `install_update` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Per-chunk download progress event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub progress: u8,
    pub loaded: u64,
    pub total: u64,
}

/// Events pushed from the updater to the UI layer
#[derive(Debug, Clone)]
pub enum UpdateEvent {
    StatusChanged(UpdateStatus),
    Progress(DownloadProgress),
    Downloaded,
    Error(String),
}

/// Platform identifier as the update API understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Macos,
    Linux,
}

impl Platform {
    /// Map an OS identifier onto an update API platform. Unrecognized
    /// identifiers fall back to Windows, the server's dominant install base.
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier {
            "windows" | "win32" => Platform::Windows,
            "macos" | "darwin" => Platform::Macos,
            "linux" => Platform::Linux,
            _ => Platform::Windows,
        }
    }

    /// Platform of the running process
    pub fn current() -> Self {
        Self::from_identifier(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
        }
    }
}
