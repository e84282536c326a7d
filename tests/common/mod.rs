#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use devloop::engine::EventReceiver;
use devloop::watch::ChangeEvent;

pub use devloop_test_utils::builders::SettingsBuilder;
pub use devloop_test_utils::{init_tracing, with_timeout};

/// Collect events until `quiet` passes without a new one, or `max` elapses.
pub async fn collect_events(rx: &mut EventReceiver, quiet: Duration, max: Duration) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + max;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(quiet.min(remaining), rx.recv()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) | Err(_) => break,
        }
    }
    events
}

/// Wait until an event matching `pred` arrives, failing after `max`.
pub async fn wait_for<F>(rx: &mut EventReceiver, max: Duration, mut pred: F) -> ChangeEvent
where
    F: FnMut(&ChangeEvent) -> bool,
{
    tokio::time::timeout(max, async {
        loop {
            match rx.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("event queue closed while waiting"),
            }
        }
    })
    .await
    .expect("expected event did not arrive in time")
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, contents).expect("write file");
}
