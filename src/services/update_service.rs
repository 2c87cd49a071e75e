//! Update manager: check, download, verify and install portal updates
//!
//! One [`UpdateManager`] exists per process. It owns the persisted config and
//! the in-memory status record, talks to the portal's update API, and pushes
//! [`UpdateEvent`]s to the UI through an [`EventSink`]. All mutation of the
//! status goes through this type, which is what keeps the one-check /
//! one-download-at-a-time convention honest.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tauri::Emitter;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::{HwDesktopError, Result};
use crate::models::{
    CancelResult, CheckResult, CheckUpdateResponse, DownloadProgress, DownloadResult, Platform,
    UpdateConfig, UpdateConfigPatch, UpdateEvent, UpdateStatus, VersionInfo,
};
use crate::services::cancellation::CancellationToken;
use crate::services::config_store::ConfigStore;
use crate::services::installer::{
    strategy_for_identifier, ArtifactLauncher, InstallOutcome, UpdatePrompt,
};

/// Receives updater events for delivery to the UI layer
pub trait EventSink: Send + Sync + 'static {
    fn send(&self, event: UpdateEvent);
}

/// Surfaces an update-available notice outside the normal event channel
pub trait UpdateNotifier: Send + Sync + 'static {
    fn update_available(&self, info: &VersionInfo);
}

enum TransferOutcome {
    Complete(PathBuf),
    Cancelled,
}

/// Single per-process owner of updater config and status
pub struct UpdateManager {
    client: reqwest::Client,
    store: ConfigStore,
    updates_dir: PathBuf,
    current_version: String,
    config: RwLock<UpdateConfig>,
    status: RwLock<UpdateStatus>,
    cancel: Mutex<CancellationToken>,
    events: Box<dyn EventSink>,
    notifier: Box<dyn UpdateNotifier>,
    periodic: Mutex<Option<JoinHandle<()>>>,
}

/// Shared handle managed as Tauri state
pub type UpdateState = Arc<UpdateManager>;

impl UpdateManager {
    pub fn new(
        store: ConfigStore,
        updates_dir: PathBuf,
        events: Box<dyn EventSink>,
        notifier: Box<dyn UpdateNotifier>,
    ) -> Self {
        let config = store.load();
        Self {
            client: reqwest::Client::new(),
            store,
            updates_dir,
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            config: RwLock::new(config),
            status: RwLock::new(UpdateStatus::default()),
            cancel: Mutex::new(CancellationToken::new()),
            events,
            notifier,
            periodic: Mutex::new(None),
        }
    }

    /// Current status snapshot
    pub async fn status(&self) -> UpdateStatus {
        self.status.read().await.clone()
    }

    /// Current config snapshot
    pub async fn config(&self) -> UpdateConfig {
        self.config.read().await.clone()
    }

    /// Apply a config patch and persist it immediately
    pub async fn set_config(&self, patch: UpdateConfigPatch) -> Result<UpdateConfig> {
        if let Some(server_url) = &patch.server_url {
            url::Url::parse(server_url)
                .map_err(|e| HwDesktopError::Config(format!("Invalid server URL: {}", e)))?;
        }
        let mut config = self.config.write().await;
        patch.apply(&mut config);
        self.store.save(&config)?;
        Ok(config.clone())
    }

    /// Check the update API for a newer version.
    ///
    /// Non-forced calls coalesce with a check already in flight. The
    /// check-interval in the config is carried but does not gate checks;
    /// every call that gets past the in-flight guard hits the network.
    pub async fn check_for_updates(self: Arc<Self>, force: bool) -> Result<CheckResult> {
        {
            let mut status = self.status.write().await;
            if status.checking && !force {
                return Ok(CheckResult::already_checking());
            }
            status.checking = true;
            status.available = false;
            status.error = None;
            self.events.send(UpdateEvent::StatusChanged(status.clone()));
        }

        let outcome = self.perform_check().await;

        let (result, response) = {
            let mut status = self.status.write().await;
            status.checking = false;
            let pair = match outcome {
                Ok(Some(response)) => {
                    let info = response.version_info();
                    status.available = true;
                    status.version_info = Some(info.clone());
                    status.force_update = response.force_update;
                    tracing::info!(
                        "Update available: {} -> {}",
                        self.current_version,
                        info.version
                    );
                    (
                        Ok(CheckResult::update_available(info, response.force_update)),
                        Some(response),
                    )
                }
                Ok(None) => {
                    tracing::debug!("No update available");
                    (Ok(CheckResult::no_update()), None)
                }
                Err(e) => {
                    tracing::warn!("Update check failed: {}", e);
                    status.error = Some(e.to_string());
                    (Err(e), None)
                }
            };
            self.events.send(UpdateEvent::StatusChanged(status.clone()));
            pair
        };

        if let Some(response) = response {
            let config = self.config.read().await.clone();
            if config.auto_download {
                // Best effort: failures are logged, never propagated
                let manager = Arc::clone(&self);
                tokio::spawn(async move {
                    if let Err(e) = manager.download_update().await {
                        tracing::warn!("Automatic update download failed: {}", e);
                    }
                });
            } else if config.show_notification {
                self.notifier.update_available(&response.version_info());
            }
        }

        result
    }

    async fn perform_check(&self) -> Result<Option<CheckUpdateResponse>> {
        let server_url = self.config.read().await.server_url.clone();
        let platform = Platform::current();
        let url = format!(
            "{}/check_update?platform={}&version={}",
            server_url.trim_end_matches('/'),
            platform.as_str(),
            self.current_version
        );

        tracing::info!("Checking for updates: {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let data: CheckUpdateResponse = response.json().await?;

        {
            let mut config = self.config.write().await;
            config.last_check = Some(Utc::now());
            if let Err(e) = self.store.save(&config) {
                tracing::warn!("Failed to persist update config: {}", e);
            }
        }

        if data.status == "success" && data.has_update {
            Ok(Some(data))
        } else {
            Ok(None)
        }
    }

    /// Download the available update artifact and verify its checksum.
    ///
    /// At most one transfer runs at a time; a second call observes the
    /// in-flight progress. Once downloaded, further calls return the same
    /// path without re-fetching.
    pub async fn download_update(&self) -> Result<DownloadResult> {
        let (info, token) = {
            let mut status = self.status.write().await;
            if !status.available {
                return Err(HwDesktopError::NoUpdateAvailable);
            }
            if status.downloading {
                return Ok(DownloadResult::in_progress(status.progress));
            }
            if status.downloaded {
                let path = status.download_path.clone().unwrap_or_default();
                return Ok(DownloadResult::completed(path));
            }
            let Some(info) = status.version_info.clone() else {
                return Err(HwDesktopError::NoUpdateAvailable);
            };
            status.downloading = true;
            status.progress = 0;
            status.error = None;
            self.events.send(UpdateEvent::StatusChanged(status.clone()));

            let token = CancellationToken::new();
            *self.cancel.lock().unwrap() = token.clone();
            (info, token)
        };

        match self.transfer(&info, &token).await {
            Ok(TransferOutcome::Complete(path)) => {
                let path_str = path.display().to_string();
                {
                    let mut status = self.status.write().await;
                    status.downloading = false;
                    status.downloaded = true;
                    status.progress = 100;
                    status.download_path = Some(path_str.clone());
                    self.events.send(UpdateEvent::StatusChanged(status.clone()));
                }
                self.events.send(UpdateEvent::Downloaded);
                tracing::info!("Update downloaded to {}", path_str);
                Ok(DownloadResult::completed(path_str))
            }
            Ok(TransferOutcome::Cancelled) => {
                // cancel_update already reset the flags and notified the UI
                Ok(DownloadResult::cancelled())
            }
            Err(e) => {
                {
                    let mut status = self.status.write().await;
                    status.downloading = false;
                    status.error = Some(e.to_string());
                    self.events.send(UpdateEvent::StatusChanged(status.clone()));
                }
                self.events.send(UpdateEvent::Error(e.to_string()));
                tracing::warn!("Update download failed: {}", e);
                Err(e)
            }
        }
    }

    async fn transfer(
        &self,
        info: &VersionInfo,
        token: &CancellationToken,
    ) -> Result<TransferOutcome> {
        let server_url = self.config.read().await.server_url.clone();
        let url = format!(
            "{}/download/{}",
            server_url.trim_end_matches('/'),
            info.filename
        );

        std::fs::create_dir_all(&self.updates_dir)?;
        let target = self.updates_dir.join(&info.filename);
        tracing::info!("Downloading update {} to {}", url, target.display());

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let total = response.content_length().unwrap_or(0);

        let mut file = tokio::fs::File::create(&target).await?;
        let mut stream = response.bytes_stream();
        let mut loaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            if token.is_cancelled() {
                tracing::info!("Update download cancelled");
                return Ok(TransferOutcome::Cancelled);
            }
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            loaded += chunk.len() as u64;

            let progress = progress_percent(loaded, total);
            self.status.write().await.progress = progress;
            self.events.send(UpdateEvent::Progress(DownloadProgress {
                progress,
                loaded,
                total,
            }));
        }
        file.flush().await?;
        drop(file);

        if token.is_cancelled() {
            tracing::info!("Update download cancelled");
            return Ok(TransferOutcome::Cancelled);
        }

        let expected = info.md5.trim().to_lowercase();
        if !expected.is_empty() {
            let actual = compute_file_md5(&target)?;
            if actual != expected {
                // Leave the partial artifact in place; a retry overwrites it
                return Err(HwDesktopError::ChecksumMismatch { expected, actual });
            }
            tracing::info!("Checksum verified for {}", info.filename);
        }

        Ok(TransferOutcome::Complete(target))
    }

    /// Cancel the in-flight download. Aborts the transfer at the next chunk
    /// boundary; the partial file stays on disk.
    pub async fn cancel_update(&self) -> CancelResult {
        let mut status = self.status.write().await;
        if !status.downloading {
            return CancelResult::rejected("No download in progress");
        }
        status.downloading = false;
        status.progress = 0;
        self.cancel.lock().unwrap().cancel();
        self.events.send(UpdateEvent::StatusChanged(status.clone()));
        CancelResult::ok()
    }

    /// Install the downloaded update using the current platform's strategy
    pub async fn install_update(
        &self,
        prompt: &dyn UpdatePrompt,
        launcher: &dyn ArtifactLauncher,
    ) -> Result<InstallOutcome> {
        self.install_update_on(std::env::consts::OS, prompt, launcher)
            .await
    }

    /// Install using the strategy for an explicit OS identifier
    pub async fn install_update_on(
        &self,
        os: &str,
        prompt: &dyn UpdatePrompt,
        launcher: &dyn ArtifactLauncher,
    ) -> Result<InstallOutcome> {
        let path = {
            let status = self.status.read().await;
            if !status.downloaded {
                return Err(HwDesktopError::NotDownloaded);
            }
            match &status.download_path {
                Some(path) => PathBuf::from(path),
                None => return Err(HwDesktopError::NotDownloaded),
            }
        };
        if !path.exists() {
            return Err(HwDesktopError::ArtifactMissing(path.display().to_string()));
        }

        let strategy = strategy_for_identifier(os)?;
        strategy.install(&path, prompt, launcher)
    }

    /// Start re-checking for updates every `interval_hours` hours
    pub fn start_periodic_check(self: Arc<Self>, interval_hours: u32) {
        self.stop_periodic_check();

        let manager = Arc::clone(&self);
        let interval = Duration::from_secs(u64::from(interval_hours) * 3600);
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                tracing::info!("Running scheduled update check");
                if let Err(e) = Arc::clone(&manager).check_for_updates(false).await {
                    tracing::warn!("Scheduled update check failed: {}", e);
                }
            }
        });

        *self.periodic.lock().unwrap() = Some(task);
        tracing::info!(
            "Started periodic update checking (interval: {} hours)",
            interval_hours
        );
    }

    /// Stop the periodic check task
    pub fn stop_periodic_check(&self) {
        if let Some(task) = self.periodic.lock().unwrap().take() {
            task.abort();
            tracing::info!("Stopped periodic update checking");
        }
    }

    /// Whether the periodic check task is running
    pub fn is_periodic_check_running(&self) -> bool {
        self.periodic
            .lock()
            .unwrap()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

/// Completion percentage, clamped to 100 in case the server under-reports
/// the content length. Unknown length reports 0.
fn progress_percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((loaded as f64 / total as f64) * 100.0).floor().min(100.0) as u8
}

/// Compute the lowercase hex MD5 of a file on disk
pub fn compute_file_md5(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", md5::compute(bytes)))
}

/// Event sink that forwards updater events to the main window
pub struct TauriEventSink {
    app: tauri::AppHandle,
}

impl TauriEventSink {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

impl EventSink for TauriEventSink {
    fn send(&self, event: UpdateEvent) {
        let result = match event {
            UpdateEvent::StatusChanged(status) => self.app.emit("update-status-changed", status),
            UpdateEvent::Progress(progress) => self.app.emit("update-download-progress", progress),
            UpdateEvent::Downloaded => self.app.emit("update-downloaded", ()),
            UpdateEvent::Error(message) => self.app.emit("update-download-error", message),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to emit update event: {}", e);
        }
    }
}

/// Notifier backed by the system notification plugin
pub struct SystemNotifier {
    app: tauri::AppHandle,
}

impl SystemNotifier {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

impl UpdateNotifier for SystemNotifier {
    fn update_available(&self, info: &VersionInfo) {
        use tauri_plugin_notification::NotificationExt;
        let result = self
            .app
            .notification()
            .builder()
            .title("Update available")
            .body(format!(
                "Version {} is available for download.",
                info.version
            ))
            .show();
        if let Err(e) = result {
            tracing::warn!("Failed to show update notification: {}", e);
        }
    }
}
