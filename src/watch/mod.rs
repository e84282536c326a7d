// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Deciding which paths matter for a rebuild (`filter`).
//! - Polling directories and diffing their snapshots (`poller`, `snapshot`),
//!   one task per directory, tracked in a `registry`.
//! - An alternative watcher on top of OS notifications (`notify_watcher`).
//!
//! Both watchers implement [`DirectoryWatcher`] and only ever talk to the rest
//! of the program through the event queue.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::Result;

pub mod filter;
pub mod notify_watcher;
pub mod path_utils;
pub mod poller;
pub mod registry;
pub mod snapshot;

pub use filter::WatchFilter;
pub use notify_watcher::NotifyWatcher;
pub use poller::PollingWatcher;
pub use registry::WatchRegistry;
pub use snapshot::{DirectorySnapshot, EntryChange, EntryStamp};

/// A relevant change somewhere under the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Initial kick so the first build happens without any file change.
    Startup,
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
    /// A watched directory vanished; its poll task has stopped.
    DirectoryRemoved(PathBuf),
}

impl ChangeEvent {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ChangeEvent::Startup => None,
            ChangeEvent::Created(p)
            | ChangeEvent::Modified(p)
            | ChangeEvent::Removed(p)
            | ChangeEvent::DirectoryRemoved(p) => Some(p),
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEvent::Startup => write!(f, "startup"),
            ChangeEvent::Created(p) => write!(f, "created {}", p.display()),
            ChangeEvent::Modified(p) => write!(f, "modified {}", p.display()),
            ChangeEvent::Removed(p) => write!(f, "removed {}", p.display()),
            ChangeEvent::DirectoryRemoved(p) => write!(f, "directory removed {}", p.display()),
        }
    }
}

/// Something that turns filesystem changes under a directory into
/// [`ChangeEvent`]s on the event queue.
pub trait DirectoryWatcher: Send + Sync {
    /// Start watching `path` and everything below it. Does not block.
    fn watch(&self, path: &Path) -> Result<()>;

    /// Directories currently being watched.
    fn watched(&self) -> Vec<PathBuf>;

    /// Stop every watch started through this watcher.
    fn shutdown(&self);
}
