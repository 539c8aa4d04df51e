use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chrono::Local;
use notify::{
    event::{ModifyKind, RenameMode},
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::MonitorEvent;

/// Recursively monitors a root directory and pushes one message per observed
/// change onto the daemon channel. The OS delivers notifications on the
/// watcher's own thread; log I/O stays on the writer side of the channel.
pub struct FileMonitor {
    sender: mpsc::Sender<MonitorEvent>,
    watcher: Option<RecommendedWatcher>,
    root: PathBuf,
}

impl FileMonitor {
    /// Starts watching `root`. A root that doesn't exist is a configuration
    /// error, not a silent no-op.
    pub fn start(root: &Path, sender: mpsc::Sender<MonitorEvent>) -> Result<Self> {
        let mut monitor = Self {
            sender,
            watcher: None,
            root: PathBuf::new(),
        };
        monitor.retarget(root)?;
        Ok(monitor)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Moves the watch to `new_root`. The previous OS observer is stopped
    /// before the next one starts, so watch sessions never overlap.
    pub fn retarget(&mut self, new_root: &Path) -> Result<()> {
        if !new_root.is_dir() {
            bail!("Monitored root {new_root:?} does not exist or is not a directory");
        }

        self.watcher.take();

        let mut watcher = build_watcher(self.sender.clone())?;
        watcher.watch(new_root, RecursiveMode::Recursive)?;
        debug!("Watching {new_root:?}");

        self.watcher = Some(watcher);
        self.root = new_root.to_owned();
        Ok(())
    }
}

fn build_watcher(sender: mpsc::Sender<MonitorEvent>) -> Result<RecommendedWatcher> {
    let watcher = RecommendedWatcher::new(
        move |event: notify::Result<Event>| match event {
            Ok(event) => {
                for message in normalize_event(&event) {
                    let record = MonitorEvent {
                        timestamp: Local::now(),
                        message,
                    };
                    // Fails only when the writer is gone, i.e. on shutdown.
                    if sender.blocking_send(record).is_err() {
                        return;
                    }
                }
            }
            // A single unreadable path must not stop the watcher.
            Err(e) => warn!("Skipping undeliverable filesystem event {e:?}"),
        },
        notify::Config::default(),
    )?;
    Ok(watcher)
}

/// Maps an OS notification to the persisted message forms. Renaming is
/// treated identically to moving.
fn normalize_event(event: &Event) -> Vec<String> {
    match event.kind {
        EventKind::Create(_) => per_path(event, "File created"),
        EventKind::Remove(_) => per_path(event, "File deleted"),
        EventKind::Modify(ModifyKind::Name(rename)) => match (rename, event.paths.as_slice()) {
            (_, [src, dest]) => {
                vec![format!("File moved: {} -> {}", src.display(), dest.display())]
            }
            // One-sided rename halves arrive as the departure/arrival the OS
            // saw them as.
            (RenameMode::From, _) => per_path(event, "File deleted"),
            (RenameMode::To, _) => per_path(event, "File created"),
            _ => per_path(event, "File modified"),
        },
        EventKind::Modify(_) => per_path(event, "File modified"),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => vec![],
    }
}

fn per_path(event: &Event, action: &str) -> Vec<String> {
    event
        .paths
        .iter()
        .map(|path| format!("{action}: {}", path.display()))
        .collect()
}
