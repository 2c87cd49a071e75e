//! Test utilities: fakes for the installer seams and manager construction

#![cfg(test)]

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::models::{UpdateConfig, UpdateEvent, VersionInfo};
use crate::services::config_store::ConfigStore;
use crate::services::installer::{ArtifactLauncher, UpdatePrompt};
use crate::services::update_service::{EventSink, UpdateManager, UpdateNotifier};

/// Event sink that records everything it is sent
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<UpdateEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn send(&self, event: UpdateEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Notifier that drops every notification
pub struct NullNotifier;

impl UpdateNotifier for NullNotifier {
    fn update_available(&self, _info: &VersionInfo) {}
}

/// Prompt fake with a fixed answer, recording what it was shown
pub struct FakePrompt {
    accept: bool,
    confirms: Mutex<u32>,
    errors: Mutex<Vec<String>>,
}

impl FakePrompt {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            confirms: Mutex::new(0),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            accept: false,
            ..Self::accepting()
        }
    }

    pub fn confirms(&self) -> u32 {
        *self.confirms.lock().unwrap()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl UpdatePrompt for FakePrompt {
    fn confirm(&self, _title: &str, _message: &str, _accept: &str, _decline: &str) -> bool {
        *self.confirms.lock().unwrap() += 1;
        self.accept
    }

    fn show_error(&self, _title: &str, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Launcher fake that records spawn requests instead of spawning
pub struct RecordingLauncher {
    fail: bool,
    launched: Mutex<Vec<(PathBuf, Vec<String>)>>,
    opened: Mutex<Vec<PathBuf>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self {
            fail: false,
            launched: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn launched(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.launched.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl ArtifactLauncher for RecordingLauncher {
    fn launch_detached(&self, program: &Path, args: &[&str]) -> std::io::Result<()> {
        if self.fail {
            return Err(std::io::Error::other("spawn refused"));
        }
        self.launched.lock().unwrap().push((
            program.to_path_buf(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        Ok(())
    }

    fn open_with_default_handler(&self, path: &Path) -> std::io::Result<()> {
        if self.fail {
            return Err(std::io::Error::other("open refused"));
        }
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Build a manager whose config points at `server_url`, with auto-download
/// off so checks never kick off background transfers on their own
pub fn manager_with_server(server_url: &str) -> (Arc<UpdateManager>, TempDir, RecordingSink) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = ConfigStore::new(dir.path());
    let mut config = UpdateConfig::default();
    config.server_url = server_url.to_string();
    config.auto_download = false;
    config.show_notification = false;
    store.save(&config).expect("Failed to seed config");

    let sink = RecordingSink::default();
    let manager = Arc::new(UpdateManager::new(
        store,
        dir.path().join("Updates"),
        Box::new(sink.clone()),
        Box::new(NullNotifier),
    ));
    (manager, dir, sink)
}

/// URL of a loopback port that nothing is listening on
pub fn unroutable_url() -> String {
    // Bind to grab a free port, then drop the listener so connects fail
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("Failed to get addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}/api/update", port)
}
