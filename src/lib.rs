// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::context::Context;
use crate::engine::{Coordinator, CycleOptions, EVENT_QUEUE_CAPACITY, event_queue};
use crate::exec::signal::raise_open_file_limit;
use crate::exec::{CommandBuilder, ProcessSupervisor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::WatcherKind;
use crate::watch::{ChangeEvent, DirectoryWatcher, NotifyWatcher, PollingWatcher};

/// Open-file limit requested at startup; one poll task per directory.
pub const OPEN_FILE_LIMIT: u64 = 10_000;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the output directory and process limits
/// - the watcher and the event queue
/// - the coordinator with the real compiler and process backends
/// - Ctrl-C handling and fatal watcher failures
pub async fn run(settings: Settings) -> Result<()> {
    let settings = Arc::new(settings);

    if let Err(e) = raise_open_file_limit(OPEN_FILE_LIMIT) {
        warn!(error = %e, limit = OPEN_FILE_LIMIT, "could not raise open file limit");
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let output_path = settings.output_path();
    if let Err(e) = fs.create_dir_all(&output_path) {
        error!(error = %format!("{e:#}"), path = %output_path.display(), "could not create output directory");
    }

    let (events, event_rx) = event_queue(EVENT_QUEUE_CAPACITY);
    let (ctx, mut failures) = Context::new(settings.clone(), fs.clone(), events.clone());

    let watcher: Box<dyn DirectoryWatcher> = match settings.watcher_kind() {
        WatcherKind::Poll => Box::new(PollingWatcher::new(ctx)),
        WatcherKind::Notify => Box::new(NotifyWatcher::new(ctx)),
    };
    watcher.watch(&settings.root())?;
    info!(root = %settings.root().display(), kind = ?settings.watcher_kind(), "watching");

    let mut coordinator = Coordinator::new(
        event_rx,
        CommandBuilder::from_settings(&settings),
        ProcessSupervisor::from_settings(&settings),
        fs,
        CycleOptions::from_settings(&settings),
    );

    // The first build does not wait for a change.
    events.send(ChangeEvent::Startup).await;

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let outcome = tokio::select! {
        res = coordinator.run() => res.map_err(anyhow::Error::from),
        () = interrupted => {
            info!("interrupted; shutting down");
            Ok(())
        }
        Some(failure) = failures.recv() => Err(failure.into()),
    };

    watcher.shutdown();
    if let Err(e) = coordinator.shutdown().await {
        warn!(error = %e, "failed to stop running instance");
    }

    outcome
}
