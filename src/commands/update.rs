//! Update commands: the IPC surface the portal UI drives the updater with
//!
//! Every handler converts component errors into the structured result shapes
//! the UI expects; nothing is allowed to cross the boundary as an unhandled
//! error. Preconditions are re-validated here as well, so racing invocations
//! from the webview cannot bypass the manager's state invariants.

use std::time::Duration;

use tauri::{command, AppHandle, State};

use crate::error::Result;
use crate::models::{
    CancelResult, CheckResult, DownloadResult, InstallResult, UpdateConfig, UpdateConfigPatch,
    UpdateStatus,
};
use crate::services::installer::{DialogPrompt, InstallOutcome, SystemLauncher};
use crate::services::update_service::UpdateState;

/// Delay between launching the installer and quitting, so the child starts
const QUIT_DELAY: Duration = Duration::from_secs(1);

/// Check the portal for a newer version
#[command]
pub async fn check_for_updates(
    state: State<'_, UpdateState>,
    force: Option<bool>,
) -> Result<CheckResult> {
    match state.inner().clone().check_for_updates(force.unwrap_or(false)).await {
        Ok(result) => Ok(result),
        Err(e) => {
            tracing::warn!("Update check failed: {}", e);
            Ok(CheckResult::failed(e.to_string()))
        }
    }
}

/// Download the available update
#[command]
pub async fn download_update(state: State<'_, UpdateState>) -> Result<DownloadResult> {
    if !state.status().await.available {
        return Ok(DownloadResult::failed("No update available"));
    }
    match state.download_update().await {
        Ok(result) => Ok(result),
        Err(e) => {
            tracing::warn!("Update download failed: {}", e);
            Ok(DownloadResult::failed(e.to_string()))
        }
    }
}

/// Install the downloaded update and schedule the process to quit
#[command]
pub async fn install_update(app: AppHandle, state: State<'_, UpdateState>) -> Result<InstallResult> {
    if !state.status().await.downloaded {
        return Ok(InstallResult::failed("Update has not been downloaded"));
    }

    let prompt = DialogPrompt::new(app.clone());
    match state.install_update(&prompt, &SystemLauncher).await {
        Ok(InstallOutcome::Launched) => {
            let handle = app.clone();
            tauri::async_runtime::spawn(async move {
                tokio::time::sleep(QUIT_DELAY).await;
                tracing::info!("Quitting for update install");
                handle.exit(0);
            });
            Ok(InstallResult::ok())
        }
        // "Later" is a normal no-op; the update stays installable
        Ok(InstallOutcome::Declined) => Ok(InstallResult::ok()),
        Err(e) => {
            tracing::warn!("Update install failed: {}", e);
            Ok(InstallResult::failed(e.to_string()))
        }
    }
}

/// Current updater status snapshot
#[command]
pub async fn get_update_status(state: State<'_, UpdateState>) -> Result<UpdateStatus> {
    Ok(state.status().await)
}

/// Cancel the in-flight download
#[command]
pub async fn cancel_update(state: State<'_, UpdateState>) -> Result<CancelResult> {
    Ok(state.cancel_update().await)
}

/// Current updater configuration
#[command]
pub async fn get_update_config(state: State<'_, UpdateState>) -> Result<UpdateConfig> {
    Ok(state.config().await)
}

/// Apply a partial config update and persist it
#[command]
pub async fn set_update_config(
    state: State<'_, UpdateState>,
    patch: UpdateConfigPatch,
) -> Result<UpdateConfig> {
    state.set_config(patch).await
}

/// Start periodic update checking
#[command]
pub async fn start_auto_update_check(
    state: State<'_, UpdateState>,
    interval_hours: u32,
) -> Result<()> {
    if interval_hours == 0 {
        return Err(crate::error::HwDesktopError::OperationFailed(
            "Interval must be greater than 0".to_string(),
        ));
    }
    state.inner().clone().start_periodic_check(interval_hours);
    Ok(())
}

/// Stop periodic update checking
#[command]
pub async fn stop_auto_update_check(state: State<'_, UpdateState>) -> Result<()> {
    state.stop_periodic_check();
    Ok(())
}

/// Check if periodic update checking is running
#[command]
pub async fn is_auto_update_running(state: State<'_, UpdateState>) -> Result<bool> {
    Ok(state.is_periodic_check_running())
}

/// Get current application version
#[command]
pub fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
