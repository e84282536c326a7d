// src/watch/notify_watcher.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::engine::queue::EventSender;
use crate::watch::filter::WatchFilter;
use crate::watch::path_utils::absolute;
use crate::watch::{ChangeEvent, DirectoryWatcher};
use crate::errors::Result;

/// [`DirectoryWatcher`] backed by OS notifications (`notify`'s recommended
/// backend, recursive mode). Not the default; select with `watcher = notify`.
pub struct NotifyWatcher {
    ctx: Context,
    filter: Arc<WatchFilter>,
    watchers: Mutex<HashMap<PathBuf, RecommendedWatcher>>,
}

impl std::fmt::Debug for NotifyWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyWatcher")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl NotifyWatcher {
    pub fn new(ctx: Context) -> Self {
        let filter = Arc::new(WatchFilter::from_settings(&ctx.settings));
        Self {
            ctx,
            filter,
            watchers: Mutex::new(HashMap::new()),
        }
    }
}

/// Map one notify event onto zero or more change events.
pub fn translate_event(filter: &WatchFilter, root: &Path, event: &Event) -> Vec<ChangeEvent> {
    event
        .paths
        .iter()
        .filter(|path| !filter.is_ignored_path(root, path))
        .filter_map(|path| {
            let path = path.clone();
            match event.kind {
                EventKind::Create(_) if path.is_dir() => {
                    filter.should_descend(&path).then(|| ChangeEvent::Created(path))
                }
                EventKind::Create(_) => {
                    filter.is_watched_file(&path).then(|| ChangeEvent::Created(path))
                }
                EventKind::Modify(_) if !path.is_dir() => {
                    filter.is_watched_file(&path).then(|| ChangeEvent::Modified(path))
                }
                EventKind::Remove(_) => {
                    filter.is_watched_file(&path).then(|| ChangeEvent::Removed(path))
                }
                _ => None,
            }
        })
        .collect()
}

fn forward(events: &EventSender, change: ChangeEvent) {
    if let Err(err) = events.try_send(change) {
        warn!(error = %err, "dropping file event");
    }
}

impl DirectoryWatcher for NotifyWatcher {
    fn watch(&self, path: &Path) -> Result<()> {
        let root = absolute(path);
        let filter = Arc::clone(&self.filter);
        let events = self.ctx.events.clone();
        let callback_root = root.clone();

        // Called synchronously on notify's own thread.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    debug!(?event, "received notify event");
                    for change in translate_event(&filter, &callback_root, &event) {
                        info!(%change, "sending event");
                        forward(&events, change);
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )
        .map_err(anyhow::Error::from)?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(anyhow::Error::from)?;

        info!(dir = %root.display(), "watching (notify)");
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root, watcher);
        Ok(())
    }

    fn watched(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        dirs.sort();
        dirs
    }

    fn shutdown(&self) {
        // Dropping a RecommendedWatcher stops it.
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
