// tests/supervisor_process.rs

#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};

use devloop::exec::{InstanceExit, ProcessSupervisor};
use devloop::types::ShutdownSignal;

use common::{SettingsBuilder, init_tracing, with_timeout, write_file};

fn write_script(path: &Path, body: &str) -> PathBuf {
    write_file(path, &format!("#!/bin/sh\n{body}\n"));
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
    path.to_path_buf()
}

fn supervisor(program: PathBuf, grace: Duration) -> ProcessSupervisor {
    ProcessSupervisor::new(program, Vec::new(), ShutdownSignal::Term, grace)
}

async fn wait_for_file(path: &Path) -> String {
    with_timeout(async {
        loop {
            if let Ok(contents) = std::fs::read_to_string(path) {
                if !contents.is_empty() {
                    return contents;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}

#[tokio::test]
async fn graceful_stop_within_grace_period() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let app = write_script(&dir.path().join("app"), "exec sleep 30");
    let sup = supervisor(app, Duration::from_secs(3));

    let instance = sup.start_instance().unwrap();
    assert!(instance.pid() > 0);

    let exit = with_timeout(sup.stop_instance(instance)).await.unwrap();
    assert_eq!(
        exit,
        InstanceExit::Stopped {
            signal: ShutdownSignal::Term,
            forced: false
        }
    );
}

#[tokio::test]
async fn instance_ignoring_the_signal_is_killed_after_grace() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let ready = dir.path().join("ready");
    let app = write_script(
        &dir.path().join("stubborn"),
        &format!(
            "trap '' TERM\necho up > '{}'\nwhile true; do sleep 0.05; done",
            ready.display()
        ),
    );
    let sup = supervisor(app, Duration::from_millis(300));

    let instance = sup.start_instance().unwrap();
    wait_for_file(&ready).await;

    let started = std::time::Instant::now();
    let exit = with_timeout(sup.stop_instance(instance)).await.unwrap();

    assert_eq!(
        exit,
        InstanceExit::Stopped {
            signal: ShutdownSignal::Term,
            forced: true
        }
    );
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn stopping_an_exited_instance_returns_its_exit_code() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let app = write_script(&dir.path().join("quick"), "exit 3");
    let sup = supervisor(app, Duration::from_secs(3));

    let instance = sup.start_instance().unwrap();
    with_timeout(async {
        while !instance.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    let exit = with_timeout(sup.stop_instance(instance)).await.unwrap();
    assert_eq!(exit, InstanceExit::Exited(Some(3)));
}

#[tokio::test]
async fn child_environment_carries_settings() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let settings = SettingsBuilder::new()
        .output_path(dir.path())
        .set("build_name", "envdump")
        .build();

    let dump = dir.path().join("env.txt");
    write_script(
        &settings.build_path(),
        &format!(
            "echo \"$DEV_RUNNER|$RUNNER_BUILD_NAME|$RUNNER_BUILD_DELAY|$RUNNER_WD\" > '{}'",
            dump.display()
        ),
    );

    let sup = ProcessSupervisor::from_settings(&settings);
    assert_eq!(sup.program(), settings.build_path());

    let instance = sup.start_instance().unwrap();
    let contents = wait_for_file(&dump).await;
    with_timeout(sup.stop_instance(instance)).await.unwrap();

    let cwd = std::env::current_dir().unwrap();
    assert_eq!(contents.trim_end(), format!("1|envdump|20|{}", cwd.display()));
}

#[tokio::test]
async fn missing_artifact_fails_to_start() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let sup = supervisor(dir.path().join("not-built-yet"), Duration::from_secs(1));

    let err = sup.start_instance().unwrap_err();
    assert!(format!("{err:#}").contains("not-built-yet"), "{err:#}");
}

#[tokio::test]
async fn kill_strays_without_matches_is_ok() {
    init_tracing();
    if std::process::Command::new("pkill").arg("-V").output().is_err() {
        eprintln!("pkill not available; skipping");
        return;
    }

    let dir = TempDir::new().unwrap();
    let sup = supervisor(dir.path().join("no-such-process-anywhere"), Duration::from_secs(1));
    with_timeout(sup.kill_strays()).await.unwrap();
}

#[tokio::test]
async fn kill_strays_matches_the_artifact_path_literally() {
    init_tracing();
    if std::process::Command::new("pkill").arg("-V").output().is_err() {
        eprintln!("pkill not available; skipping");
        return;
    }

    let dir = TempDir::new().unwrap();
    let target = write_script(&dir.path().join("app.bin"), "while true; do sleep 0.1; done");
    let lookalike = write_script(&dir.path().join("appxbin"), "while true; do sleep 0.1; done");

    let mut stray = std::process::Command::new(&target).spawn().unwrap();
    let mut bystander = std::process::Command::new(&lookalike).spawn().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let sup = supervisor(target, Duration::from_secs(1));
    with_timeout(sup.kill_strays()).await.unwrap();

    let status = with_timeout(async {
        loop {
            if let Some(status) = stray.try_wait().unwrap() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(!status.success());
    assert!(bystander.try_wait().unwrap().is_none(), "lookalike was signalled");

    bystander.kill().unwrap();
    bystander.wait().unwrap();
}

/// Records the message of every event logged under target `app`.
#[derive(Clone, Default)]
struct AppLines(Arc<Mutex<Vec<String>>>);

impl AppLines {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for AppLines {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        if event.metadata().target() != "app" {
            return;
        }
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        self.0.lock().unwrap().push(message);
    }
}

#[tokio::test]
async fn child_output_is_logged_line_by_line_and_survives_invalid_utf8() {
    let captured = AppLines::default();
    let subscriber = tracing_subscriber::registry().with(captured.clone());
    // The current-thread test runtime polls the copy tasks on this thread.
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = TempDir::new().unwrap();
    let alive = dir.path().join("alive");
    let app = write_script(
        &dir.path().join("chatty"),
        &format!(
            "echo out-1\n\
             echo err-1 >&2\n\
             printf 'latin-\\351\\n'\n\
             printf 'bad-err-\\377\\n' >&2\n\
             sleep 0.3\n\
             echo out-2\n\
             echo err-2 >&2\n\
             echo ok > '{}'\n\
             exec sleep 30",
            alive.display()
        ),
    );
    let sup = supervisor(app, Duration::from_secs(3));

    let instance = sup.start_instance().unwrap();
    wait_for_file(&alive).await;

    let expected = ["out-1", "err-1", "latin-\u{FFFD}", "bad-err-\u{FFFD}", "out-2", "err-2"];
    with_timeout(async {
        while !expected.iter().all(|l| captured.lines().iter().any(|c| c == l)) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    assert!(!instance.is_finished(), "child died after writing output");
    assert_eq!(captured.lines().len(), expected.len(), "{:?}", captured.lines());

    let exit = with_timeout(sup.stop_instance(instance)).await.unwrap();
    assert_eq!(
        exit,
        InstanceExit::Stopped {
            signal: ShutdownSignal::Term,
            forced: false
        }
    );
}
