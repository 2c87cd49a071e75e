//! Error types for the homework portal desktop client

use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum HwDesktopError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No update available")]
    NoUpdateAvailable,

    #[error("Update has not been downloaded")]
    NotDownloaded,

    #[error("Checksum mismatch: expected={expected}, actual={actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Update file not found: {0}")]
    ArtifactMissing(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Failed to launch installer: {0}")]
    InstallerLaunch(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl HwDesktopError {
    fn code(&self) -> &'static str {
        match self {
            HwDesktopError::Network(_) => "NETWORK_FAILURE",
            HwDesktopError::Io(_) => "IO_ERROR",
            HwDesktopError::Serialization(_) => "SERIALIZATION_ERROR",
            HwDesktopError::NoUpdateAvailable => "NO_UPDATE_AVAILABLE",
            HwDesktopError::NotDownloaded => "NOT_DOWNLOADED",
            HwDesktopError::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
            HwDesktopError::ArtifactMissing(_) => "ARTIFACT_MISSING",
            HwDesktopError::UnsupportedPlatform(_) => "UNSUPPORTED_PLATFORM",
            HwDesktopError::InstallerLaunch(_) => "INSTALLER_LAUNCH_FAILURE",
            HwDesktopError::Config(_) => "CONFIG_ERROR",
            HwDesktopError::OperationFailed(_) => "OPERATION_FAILED",
        }
    }
}

impl From<reqwest::Error> for HwDesktopError {
    fn from(error: reqwest::Error) -> Self {
        HwDesktopError::Network(error.to_string())
    }
}

/// Serializable error response for IPC
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&HwDesktopError> for ErrorResponse {
    fn from(error: &HwDesktopError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

// Conversion so errors cross the Tauri command boundary as structured values
impl serde::Serialize for HwDesktopError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

/// Result type alias for desktop client operations
pub type Result<T> = std::result::Result<T, HwDesktopError>;
