//! Shared helpers for integration tests

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use tempfile::TempDir;

use segskip::segments::SkipPlan;
use segskip::session::{Notification, SkipNotifier, SkipPrompt};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn segments_dir() -> PathBuf {
    fixtures_dir().join("segments")
}

/// segskip binary with its config file pointed into `config_dir`.
pub fn segskip(config_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_segskip"));
    cmd.env("SEGSKIP_CONFIG", config_dir.path().join("config.toml"))
        .env_remove("RUST_LOG");
    cmd
}

/// A directory of `<video_id>.json` segment files.
pub fn segment_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (video_id, json) in files {
        fs::write(dir.path().join(format!("{}.json", video_id)), json).unwrap();
    }
    dir
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Notifier that remembers everything.
#[derive(Default)]
pub struct Recorder {
    notifications: Mutex<Vec<Notification>>,
    prompts: Mutex<Vec<SkipPrompt>>,
}

impl Recorder {
    /// Skipped segment uuids with their plans, in order.
    pub fn skips(&self) -> Vec<(String, SkipPlan)> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notification::Skipped { segment, plan } => Some((segment.uuid.clone(), *plan)),
                _ => None,
            })
            .collect()
    }

    pub fn take_prompt(&self) -> Option<SkipPrompt> {
        self.prompts.lock().unwrap().pop()
    }
}

impl SkipNotifier for Recorder {
    fn show_skipped(&self, prompt: SkipPrompt) {
        self.prompts.lock().unwrap().push(prompt);
    }

    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
