//! Homework Portal desktop client
//!
//! A thin desktop shell around the homework submission web portal, built
//! with Tauri 2.0 and Rust. The shell's own engineering lives in the
//! auto-update subsystem: a versioned check/download/verify/install flow
//! against the portal's update API.

pub mod commands;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use tauri::{Emitter, Manager};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use services::config_store::{default_data_dir, ConfigStore};
use services::installer::UPDATED_FLAG;
use services::update_service::{SystemNotifier, TauriEventSink, UpdateManager, UpdateState};

/// Delay before the automatic check that runs at startup
const STARTUP_CHECK_DELAY: Duration = Duration::from_secs(5);

/// Initialize the application
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hw_desktop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Homework Portal desktop client");

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_notification::init())
        .setup(|app| {
            let data_dir = default_data_dir()?;
            let handle = app.handle().clone();

            let manager: UpdateState = Arc::new(UpdateManager::new(
                ConfigStore::new(&data_dir),
                data_dir.join("Updates"),
                Box::new(TauriEventSink::new(handle.clone())),
                Box::new(SystemNotifier::new(handle.clone())),
            ));
            app.manage(manager.clone());

            // Relaunched by an installer: tell the UI the update landed
            if std::env::args().any(|arg| arg == UPDATED_FLAG) {
                let success_handle = handle.clone();
                tauri::async_runtime::spawn(async move {
                    // Give the webview a moment to attach its listeners
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    if let Err(e) =
                        success_handle.emit("show-update-success", env!("CARGO_PKG_VERSION"))
                    {
                        tracing::warn!("Failed to emit update success event: {}", e);
                    }
                });
            }

            // Startup check, then periodic re-checks at the configured interval
            let startup_manager = manager.clone();
            let startup_handle = handle.clone();
            tauri::async_runtime::spawn(async move {
                tokio::time::sleep(STARTUP_CHECK_DELAY).await;
                match startup_manager.clone().check_for_updates(false).await {
                    Ok(result) if result.force_update.unwrap_or(false) => {
                        if let Err(e) =
                            startup_handle.emit("force-update-available", result.version_info)
                        {
                            tracing::warn!("Failed to emit force update event: {}", e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Startup update check failed: {}", e),
                }

                let interval_hours = startup_manager.config().await.check_interval.max(1);
                startup_manager.start_periodic_check(interval_hours);
            });

            tracing::info!("Application setup complete");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::update::check_for_updates,
            commands::update::download_update,
            commands::update::install_update,
            commands::update::get_update_status,
            commands::update::cancel_update,
            commands::update::get_update_config,
            commands::update::set_update_config,
            commands::update::start_auto_update_check,
            commands::update::stop_auto_update_check,
            commands::update::is_auto_update_running,
            commands::update::get_app_version,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
