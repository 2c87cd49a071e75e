//! Service layer for the desktop client
//!
//! The services own the long-lived updater state and the platform-specific
//! install flows; the command layer in `crate::commands` is a thin IPC shim
//! over them.

pub mod cancellation;
pub mod config_store;
pub mod installer;
pub mod update_service;

pub use cancellation::CancellationToken;
pub use config_store::{default_data_dir, ConfigStore};
pub use installer::{
    ArtifactLauncher, DialogPrompt, InstallOutcome, InstallerStrategy, SystemLauncher, UpdatePrompt,
};
pub use update_service::{
    EventSink, SystemNotifier, TauriEventSink, UpdateManager, UpdateNotifier, UpdateState,
};
