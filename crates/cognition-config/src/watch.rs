//! Directory watching and hot reload.
//!
//! The notify callback runs on the debouncer's own thread and only forwards
//! event batches over a channel. A tokio task drains the channel and runs
//! each file reload on the blocking pool.

use crate::document::document_name;
use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Notification published after every hot-reload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// The document was re-parsed and swapped in.
    Reloaded { name: String },
    /// The document failed to parse; the previous version is still active.
    Failed { name: String, error: String },
}

impl ReloadEvent {
    pub fn name(&self) -> &str {
        match self {
            ReloadEvent::Reloaded { name } | ReloadEvent::Failed { name, .. } => name,
        }
    }
}

/// Owns a running directory watcher.
///
/// Dropping the handle, or calling [`stop`](Self::stop), stops the watcher
/// and its reload task.
pub struct WatchHandle {
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
    task: Option<JoinHandle<()>>,
    directory: PathBuf,
}

impl WatchHandle {
    pub fn directory(&self) -> &std::path::Path {
        &self.directory
    }

    pub fn is_running(&self) -> bool {
        self.debouncer.is_some() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let was_running = self.debouncer.is_some();
        // Dropping the debouncer closes the channel, which ends the task.
        drop(self.debouncer.take());
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if was_running {
            info!(directory = %self.directory.display(), "stopped configuration watcher");
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("directory", &self.directory)
            .field("running", &self.is_running())
            .finish()
    }
}

pub(crate) fn spawn(store: ConfigStore) -> ConfigResult<WatchHandle> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| ConfigError::Watch(format!("no tokio runtime available: {e}")))?;

    let directory = store.directory().to_path_buf();
    if !directory.is_dir() {
        return Err(ConfigError::DirectoryMissing { path: directory });
    }

    let (tx, rx) = mpsc::unbounded_channel::<DebounceEventResult>();
    let debouncer = new_debouncer(store.debounce(), None, move |result: DebounceEventResult| {
        let _ = tx.send(result);
    })?;

    // From here on the handle owns the debouncer; any early return drops it.
    let mut handle = WatchHandle {
        debouncer: Some(debouncer),
        task: None,
        directory: directory.clone(),
    };

    if let Some(debouncer) = handle.debouncer.as_mut() {
        debouncer.watch(&directory, RecursiveMode::NonRecursive)?;
    }

    handle.task = Some(runtime.spawn(run_reload_loop(store, rx)));
    info!(directory = %directory.display(), "watching configuration directory");
    Ok(handle)
}

async fn run_reload_loop(store: ConfigStore, mut rx: mpsc::UnboundedReceiver<DebounceEventResult>) {
    while let Some(result) = rx.recv().await {
        let events = match result {
            Ok(events) => events,
            Err(errors) => {
                for e in errors {
                    warn!(error = %e, "configuration watcher error");
                }
                continue;
            }
        };

        let mut changed: Vec<PathBuf> = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Modify(_) | EventKind::Create(_)))
            .flat_map(|e| e.paths.iter().cloned())
            .filter(|p| document_name(p).is_some())
            .collect();
        changed.sort();
        changed.dedup();

        for path in changed {
            if !path.is_file() {
                debug!(path = %path.display(), "changed path is no longer a file, skipping");
                continue;
            }
            // Failures are logged and published by the store.
            let reloader = store.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || reloader.reload_path(&path)).await {
                warn!(error = %e, "configuration reload task failed");
            }
        }
    }
    debug!("configuration watcher channel closed");
}
