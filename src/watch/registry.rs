// src/watch/registry.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;
use tracing::debug;

/// Registry of per-directory watch tasks, keyed by absolute directory path.
///
/// A directory is watched by at most one task. Tasks deregister themselves
/// when their directory disappears; [`WatchRegistry::shutdown`] aborts the rest.
#[derive(Debug, Clone, Default)]
pub struct WatchRegistry {
    tasks: Arc<Mutex<HashMap<PathBuf, AbortHandle>>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, AbortHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `dir`, calling `spawn` to start its task only if the
    /// directory is not already watched. Returns `false` for duplicates.
    ///
    /// `spawn` runs under the registry lock, so a task that finishes
    /// immediately still finds its own entry when it deregisters.
    pub fn register_with<F>(&self, dir: PathBuf, spawn: F) -> bool
    where
        F: FnOnce() -> AbortHandle,
    {
        let mut tasks = self.lock();
        if tasks.contains_key(&dir) {
            debug!(dir = %dir.display(), "directory already watched");
            return false;
        }
        let handle = spawn();
        tasks.insert(dir, handle);
        true
    }

    /// Forget `dir` without aborting its task (the task is exiting anyway).
    pub fn deregister(&self, dir: &Path) -> bool {
        self.lock().remove(dir).is_some()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.lock().contains_key(dir)
    }

    /// Currently watched directories, sorted.
    pub fn watched(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.lock().keys().cloned().collect();
        dirs.sort();
        dirs
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Abort every registered task. Returns how many were aborted.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        for (dir, handle) in drained.iter() {
            debug!(dir = %dir.display(), "aborting watch task");
            handle.abort();
        }
        drained.len()
    }
}
