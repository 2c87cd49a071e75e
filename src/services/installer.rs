//! Per-platform installation of a downloaded update artifact
//!
//! Each platform gets its own [`InstallerStrategy`]. The user-facing confirm
//! dialog and the actual process spawning sit behind the [`UpdatePrompt`] and
//! [`ArtifactLauncher`] seams so the strategies can be unit tested with fakes.

use std::path::Path;
use std::process::{Command, Stdio};

use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use crate::error::{HwDesktopError, Result};

/// Flag passed to the relaunched process so it can show a post-update notice
pub const UPDATED_FLAG: &str = "--updated";

/// Outcome of an install attempt that did not error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The installer (or new version) was launched; the caller should quit
    Launched,
    /// The user chose "Later"; status stays downloaded and install can rerun
    Declined,
}

/// Confirm dialogs and error boxes shown during install
pub trait UpdatePrompt: Send + Sync {
    fn confirm(&self, title: &str, message: &str, accept: &str, decline: &str) -> bool;
    fn show_error(&self, title: &str, message: &str);
}

/// Spawns the update artifact as a process detached from this one
pub trait ArtifactLauncher: Send + Sync {
    /// Launch an executable detached, with arguments
    fn launch_detached(&self, program: &Path, args: &[&str]) -> std::io::Result<()>;
    /// Open a file with the OS default handler, detached
    fn open_with_default_handler(&self, path: &Path) -> std::io::Result<()>;
}

/// Installation flow for one platform
pub trait InstallerStrategy: Send + Sync + std::fmt::Debug {
    fn install(
        &self,
        artifact: &Path,
        prompt: &dyn UpdatePrompt,
        launcher: &dyn ArtifactLauncher,
    ) -> Result<InstallOutcome>;
}

/// Select the strategy for an OS identifier (as in `std::env::consts::OS`)
pub fn strategy_for_identifier(os: &str) -> Result<Box<dyn InstallerStrategy>> {
    match os {
        "windows" | "win32" => Ok(Box::new(WindowsInstaller)),
        "macos" | "darwin" => Ok(Box::new(MacosInstaller)),
        "linux" => Ok(Box::new(LinuxInstaller)),
        other => Err(HwDesktopError::UnsupportedPlatform(other.to_string())),
    }
}

/// Windows: run the downloaded setup executable, then quit
#[derive(Debug)]
pub struct WindowsInstaller;

impl InstallerStrategy for WindowsInstaller {
    fn install(
        &self,
        artifact: &Path,
        prompt: &dyn UpdatePrompt,
        launcher: &dyn ArtifactLauncher,
    ) -> Result<InstallOutcome> {
        let accepted = prompt.confirm(
            "Install update",
            "The new version has finished downloading. The application will close and the update will be installed.",
            "Install",
            "Later",
        );
        if !accepted {
            return Ok(InstallOutcome::Declined);
        }

        tracing::info!("Launching installer: {}", artifact.display());
        if let Err(e) = launcher.launch_detached(artifact, &[UPDATED_FLAG]) {
            prompt.show_error("Update error", &format!("Failed to launch installer: {}", e));
            return Err(HwDesktopError::InstallerLaunch(e.to_string()));
        }
        Ok(InstallOutcome::Launched)
    }
}

/// macOS: open the downloaded disk image; installation itself is manual
#[derive(Debug)]
pub struct MacosInstaller;

impl InstallerStrategy for MacosInstaller {
    fn install(
        &self,
        artifact: &Path,
        prompt: &dyn UpdatePrompt,
        launcher: &dyn ArtifactLauncher,
    ) -> Result<InstallOutcome> {
        let accepted = prompt.confirm(
            "Install update",
            "The new version has finished downloading. The update package will be opened; please install it manually.",
            "Open package",
            "Later",
        );
        if !accepted {
            return Ok(InstallOutcome::Declined);
        }

        tracing::info!("Opening update package: {}", artifact.display());
        if let Err(e) = launcher.open_with_default_handler(artifact) {
            prompt.show_error(
                "Update error",
                &format!("Failed to open update package: {}", e),
            );
            return Err(HwDesktopError::InstallerLaunch(e.to_string()));
        }
        Ok(InstallOutcome::Launched)
    }
}

/// Linux: make the AppImage executable and launch it in place of this process
#[derive(Debug)]
pub struct LinuxInstaller;

impl InstallerStrategy for LinuxInstaller {
    fn install(
        &self,
        artifact: &Path,
        prompt: &dyn UpdatePrompt,
        launcher: &dyn ArtifactLauncher,
    ) -> Result<InstallOutcome> {
        let accepted = prompt.confirm(
            "Install update",
            "The new version has finished downloading. The application will close and the new version will start.",
            "Launch new version",
            "Later",
        );
        if !accepted {
            return Ok(InstallOutcome::Declined);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(artifact, std::fs::Permissions::from_mode(0o755))?;
        }

        tracing::info!("Launching new version: {}", artifact.display());
        if let Err(e) = launcher.launch_detached(artifact, &[UPDATED_FLAG]) {
            prompt.show_error(
                "Update error",
                &format!("Failed to launch new version: {}", e),
            );
            return Err(HwDesktopError::InstallerLaunch(e.to_string()));
        }
        Ok(InstallOutcome::Launched)
    }
}

/// Launcher backed by `std::process::Command`
pub struct SystemLauncher;

impl ArtifactLauncher for SystemLauncher {
    fn launch_detached(&self, program: &Path, args: &[&str]) -> std::io::Result<()> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        // The child is intentionally not waited on; it must outlive us
        command.spawn().map(|_| ())
    }

    fn open_with_default_handler(&self, path: &Path) -> std::io::Result<()> {
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";
        #[cfg(windows)]
        let opener = "explorer";

        let mut command = Command::new(opener);
        command
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command.spawn().map(|_| ())
    }
}

/// Prompt backed by the dialog plugin, dispatched to the main thread
pub struct DialogPrompt {
    app: tauri::AppHandle,
}

impl DialogPrompt {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

impl UpdatePrompt for DialogPrompt {
    fn confirm(&self, title: &str, message: &str, accept: &str, decline: &str) -> bool {
        self.app
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Info)
            .buttons(MessageDialogButtons::OkCancelCustom(
                accept.to_string(),
                decline.to_string(),
            ))
            .blocking_show()
    }

    fn show_error(&self, title: &str, message: &str) {
        self.app
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Error)
            .blocking_show();
    }
}
