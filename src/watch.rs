//! File-watch collaborator
//!
//! A resident loop that monitors both brain files and re-invokes the
//! activation callback when either changes. Change events are coalesced
//! within a debounce window so editor write bursts trigger one
//! activation. The loop is sequential by construction: the next batch is
//! not examined until the callback for the previous one returns, which
//! serializes activations as the engine requires.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;

/// Coalesces change events until the window has been quiet.
struct ChangeBatcher {
    window: Duration,
    pending: HashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl ChangeBatcher {
    fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashSet::new(),
            last_event: None,
        }
    }

    fn add(&mut self, path: PathBuf) {
        self.pending.insert(path);
        self.last_event = Some(Instant::now());
    }

    /// A batch is ready once events stopped arriving for a full window.
    fn ready(&self) -> bool {
        match self.last_event {
            Some(last) => !self.pending.is_empty() && last.elapsed() >= self.window,
            None => false,
        }
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }
}

/// Handle for stopping a running watcher from another thread.
#[derive(Clone)]
pub struct WatchHandle {
    running: Arc<RwLock<bool>>,
}

impl WatchHandle {
    pub fn stop(&self) {
        *self.running.write() = false;
    }
}

/// Watches the two brain files and drives re-activation.
pub struct BrainWatcher {
    paths: Vec<PathBuf>,
    debounce: Duration,
    running: Arc<RwLock<bool>>,
}

impl BrainWatcher {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            paths: vec![config.execution_brain.clone(), config.quality_brain.clone()],
            debounce: Duration::from_millis(config.watch_debounce_ms),
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub fn handle(&self) -> WatchHandle {
        WatchHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Run the watch loop until stopped.
    ///
    /// `on_change` receives each coalesced batch of changed brain paths.
    /// Callback errors are logged and the loop keeps watching; a resident
    /// watcher must survive a failed activation.
    pub fn run<F>(&self, mut on_change: F) -> Result<(), SyncError>
    where
        F: FnMut(&[PathBuf]) -> Result<(), SyncError>,
    {
        *self.running.write() = true;

        let (tx, rx) = mpsc::channel();
        // Send failures mean the loop below already exited.
        let mut watcher =
            notify::recommended_watcher(move |res| {
                let _ = tx.send(res);
            })
            .map_err(notify_io)?;

        // Watch the parent directories, not the files themselves: merge
        // mode replaces the files by rename, which would detach a watch
        // registered on the old inode.
        let mut watched_dirs = HashSet::new();
        for path in &self.paths {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            if watched_dirs.insert(dir.to_path_buf()) {
                watcher
                    .watch(dir, RecursiveMode::NonRecursive)
                    .map_err(notify_io)?;
            }
        }
        info!(paths = ?self.paths, debounce_ms = self.debounce.as_millis() as u64, "Watching brain files");

        let poll = self
            .debounce
            .min(Duration::from_millis(200))
            .max(Duration::from_millis(10));
        let mut batcher = ChangeBatcher::new(self.debounce);

        loop {
            if !*self.running.read() {
                break;
            }

            match rx.recv_timeout(poll) {
                Ok(Ok(event)) => {
                    for path in event.paths {
                        if self.is_brain_path(&path) {
                            debug!(path = %path.display(), "Brain file changed");
                            batcher.add(path);
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Watch error");
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    warn!("Watcher channel disconnected");
                    break;
                }
            }

            if batcher.ready() {
                let batch = batcher.take();
                info!(changed = batch.len(), "Re-activating after brain change");
                if let Err(e) = on_change(&batch) {
                    warn!(error = %e, "Re-activation failed; continuing to watch");
                }
            }
        }

        Ok(())
    }

    fn is_brain_path(&self, path: &Path) -> bool {
        self.paths
            .iter()
            .any(|brain| brain == path || brain.file_name() == path.file_name())
    }
}

fn notify_io(err: notify::Error) -> SyncError {
    SyncError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
}
