// src/context.rs

//! Shared handles passed to every component at construction time.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::error;

use crate::config::Settings;
use crate::engine::queue::EventSender;
use crate::errors::DevloopError;
use crate::fs::FileSystem;

/// Receiver for failures that must bring the whole process down
/// (e.g. a directory that can no longer be read).
pub type FailureReceiver = mpsc::UnboundedReceiver<DevloopError>;

/// Settings, filesystem and the producer side of the event queue.
///
/// The coordinator keeps the consumer side and the current running instance
/// to itself; everything here is safe to clone into watcher tasks.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Arc<Settings>,
    pub fs: Arc<dyn FileSystem>,
    pub events: EventSender,
    failures: mpsc::UnboundedSender<DevloopError>,
}

impl Context {
    pub fn new(
        settings: Arc<Settings>,
        fs: Arc<dyn FileSystem>,
        events: EventSender,
    ) -> (Self, FailureReceiver) {
        let (failures, failure_rx) = mpsc::unbounded_channel();
        let ctx = Self {
            settings,
            fs,
            events,
            failures,
        };
        (ctx, failure_rx)
    }

    /// Report an unrecoverable error to the top-level loop.
    pub fn report_failure(&self, err: DevloopError) {
        error!(error = %err, "fatal error");
        if self.failures.send(err).is_err() {
            error!("failure channel closed; nobody is listening for fatal errors");
        }
    }
}
