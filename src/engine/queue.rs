// src/engine/queue.rs

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::watch::ChangeEvent;

/// Slots in the event queue. Large enough that a mass touch of the source
/// tree never blocks the watcher tasks.
pub const EVENT_QUEUE_CAPACITY: usize = 1000;

/// Create the single bounded queue between the watchers and the coordinator.
pub fn event_queue(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer side; cloned into every watcher task.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<ChangeEvent>,
}

impl EventSender {
    /// Queue an event, waiting for a free slot. Returns `false` once the
    /// coordinator is gone.
    pub async fn send(&self, event: ChangeEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    /// Queue an event without waiting; for callers outside the async runtime.
    pub fn try_send(&self, event: ChangeEvent) -> Result<(), TrySendError<ChangeEvent>> {
        self.tx.try_send(event)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side; owned by the coordinator.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl EventReceiver {
    /// Wait for the next event. `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Discard everything currently queued and return it (for logging).
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            debug!(%event, "discarding queued event");
            drained.push(event);
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
