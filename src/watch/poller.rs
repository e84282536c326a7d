// src/watch/poller.rs

//! Polling watcher: one Tokio task per directory, diffing snapshots on a
//! fixed interval.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::context::Context;
use crate::errors::{DevloopError, Result, is_not_a_directory, is_not_found};
use crate::fs::FileSystem;
use crate::watch::filter::WatchFilter;
use crate::watch::path_utils::absolute;
use crate::watch::registry::WatchRegistry;
use crate::watch::snapshot::{DirectorySnapshot, EntryChange};
use crate::watch::{ChangeEvent, DirectoryWatcher};

/// Default [`DirectoryWatcher`]: no OS notification primitives, just
/// `read_dir` on every watched directory each `poll_interval`.
#[derive(Debug, Clone)]
pub struct PollingWatcher {
    ctx: Context,
    filter: Arc<WatchFilter>,
    registry: WatchRegistry,
    interval: Duration,
}

/// How a poll tick ended.
enum Tick {
    Continue,
    Stop,
}

impl PollingWatcher {
    pub fn new(ctx: Context) -> Self {
        let filter = Arc::new(WatchFilter::from_settings(&ctx.settings));
        let interval = ctx.settings.poll_interval();
        Self {
            ctx,
            filter,
            registry: WatchRegistry::new(),
            interval,
        }
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub fn filter(&self) -> &WatchFilter {
        &self.filter
    }

    async fn run_directory(self, dir: PathBuf) {
        let mut snapshot = match read_snapshot(Arc::clone(&self.ctx.fs), dir.clone()).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.handle_read_error(&dir, err).await;
                return;
            }
        };

        info!(dir = %dir.display(), entries = snapshot.len(), "watching");

        // Existing subdirectories are picked up silently.
        for name in snapshot.subdirectories() {
            self.watch_child(&dir.join(name));
        }

        loop {
            sleep(self.interval).await;

            let current = match read_snapshot(Arc::clone(&self.ctx.fs), dir.clone()).await {
                Ok(current) => current,
                Err(err) => {
                    self.handle_read_error(&dir, err).await;
                    return;
                }
            };

            let changes = snapshot.diff(&current);
            if changes.is_empty() {
                continue;
            }

            if let Tick::Stop = self.report_changes(&dir, &changes).await {
                debug!(dir = %dir.display(), "event queue closed; stopping watch task");
                self.registry.deregister(&dir);
                return;
            }

            snapshot = current;
        }
    }

    /// Turn snapshot differences into queued events. Starts watching new
    /// subdirectories as a side effect.
    async fn report_changes(&self, dir: &Path, changes: &[EntryChange]) -> Tick {
        for change in changes {
            let path = dir.join(change.name());

            let event = match change {
                EntryChange::Created { is_dir: true, .. } => {
                    if !self.filter.should_descend(&path) {
                        continue;
                    }
                    info!(dir = %path.display(), "found new directory");
                    self.watch_child(&path);
                    ChangeEvent::Created(path)
                }
                // A directory that replaced a file, or came back after its
                // task exited. Already watched directories are left alone.
                EntryChange::Modified { is_dir: true, .. } => {
                    if !self.watch_child(&path) {
                        continue;
                    }
                    info!(dir = %path.display(), "found replaced directory");
                    ChangeEvent::Created(path)
                }
                EntryChange::Created { is_dir: false, .. } if self.filter.is_watched_file(&path) => {
                    info!(file = %path.display(), "found new file");
                    ChangeEvent::Created(path)
                }
                EntryChange::Modified { is_dir: false, .. } if self.filter.is_watched_file(&path) => {
                    info!(file = %path.display(), "found modified file");
                    ChangeEvent::Modified(path)
                }
                EntryChange::Removed { is_dir: false, .. } if self.filter.is_watched_file(&path) => {
                    info!(file = %path.display(), "found deleted file");
                    ChangeEvent::Removed(path)
                }
                _ => continue,
            };

            if !self.ctx.events.send(event).await {
                return Tick::Stop;
            }
        }
        Tick::Continue
    }

    /// Start watching `path` unless it is filtered out or already watched.
    /// Returns whether a new task was registered.
    fn watch_child(&self, path: &Path) -> bool {
        self.filter.should_descend(path) && self.spawn_directory_task(path.to_path_buf())
    }

    fn spawn_directory_task(&self, dir: PathBuf) -> bool {
        let watcher = self.clone();
        let task_dir = dir.clone();
        self.registry.register_with(dir, move || {
            tokio::spawn(watcher.run_directory(task_dir)).abort_handle()
        })
    }

    async fn handle_read_error(&self, dir: &Path, err: anyhow::Error) {
        self.registry.deregister(dir);

        if is_not_found(&err) || is_not_a_directory(&err) {
            info!(dir = %dir.display(), "found deleted directory");
            self.ctx
                .events
                .send(ChangeEvent::DirectoryRemoved(dir.to_path_buf()))
                .await;
            return;
        }

        self.ctx.report_failure(DevloopError::WatchFailed {
            path: dir.to_path_buf(),
            message: format!("{err:#}"),
        });
    }
}

async fn read_snapshot(fs: Arc<dyn FileSystem>, dir: PathBuf) -> anyhow::Result<DirectorySnapshot> {
    tokio::task::spawn_blocking(move || DirectorySnapshot::read(fs.as_ref(), &dir))
        .await
        .context("directory read task panicked")?
}

impl DirectoryWatcher for PollingWatcher {
    fn watch(&self, path: &Path) -> Result<()> {
        let dir = absolute(path);
        if !self.ctx.fs.exists(&dir) {
            return Err(DevloopError::WatchFailed {
                path: dir,
                message: "directory does not exist".to_string(),
            });
        }
        self.spawn_directory_task(dir);
        Ok(())
    }

    fn watched(&self) -> Vec<PathBuf> {
        self.registry.watched()
    }

    fn shutdown(&self) {
        let aborted = self.registry.shutdown();
        debug!(aborted, "polling watcher shut down");
    }
}
