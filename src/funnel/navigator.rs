//! Opening handoff links.

use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::thread;

use anyhow::{Context, Result};

use super::types::HandoffTarget;

/// Side effect of the terminal step: take the visitor to a URL
pub trait Navigator: Send + Sync {
    fn open(&self, url: &str, target: HandoffTarget) -> Result<()>;
}

/// Hands URLs to the desktop's opener (`xdg-open`, `open`, `start`).
///
/// A terminal has no tabs, so both targets end up in the default handler.
pub struct SystemNavigator {
    opener: PathBuf,
}

impl SystemNavigator {
    pub fn detect() -> Result<Self> {
        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &["open"]
        } else if cfg!(windows) {
            &["explorer.exe"]
        } else {
            &["xdg-open", "gio", "wslview"]
        };

        let opener = candidates
            .iter()
            .find_map(|cmd| which::which(cmd).ok())
            .with_context(|| format!("No URL opener found (tried {})", candidates.join(", ")))?;
        tracing::debug!("[navigator] using {:?}", opener);
        Ok(Self { opener })
    }

    /// Start the opener and reap it on a background thread
    fn launch(&self, url: &str) -> Result<thread::JoinHandle<io::Result<ExitStatus>>> {
        let mut cmd = Command::new(&self.opener);
        if self.opener.file_stem().is_some_and(|s| s == "gio") {
            cmd.arg("open");
        }
        let mut child = cmd
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch {:?}", self.opener))?;

        thread::Builder::new()
            .name("navigator-reaper".to_string())
            .spawn(move || child.wait())
            .context("Failed to spawn opener reaper thread")
    }
}

impl Navigator for SystemNavigator {
    fn open(&self, url: &str, target: HandoffTarget) -> Result<()> {
        tracing::info!("[navigator] opening {:?} link", target);
        self.launch(url)?;
        Ok(())
    }
}

/// Records URLs instead of opening them (`run --no-open`).
#[derive(Default)]
pub struct RecordingNavigator {
    opened: Mutex<Vec<(String, HandoffTarget)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<(String, HandoffTarget)> {
        self.opened
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn open(&self, url: &str, target: HandoffTarget) -> Result<()> {
        self.opened
            .lock()
            .map_err(|_| anyhow::anyhow!("navigator lock poisoned"))?
            .push((url.to_string(), target));
        Ok(())
    }
}
