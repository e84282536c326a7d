// tests/notify_watcher.rs

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::Event;
use notify::event::{AccessKind, CreateKind, DataChange, EventKind, ModifyKind, RemoveKind};
use tempfile::TempDir;

use devloop::context::Context;
use devloop::engine::event_queue;
use devloop::fs::RealFileSystem;
use devloop::watch::notify_watcher::translate_event;
use devloop::watch::{ChangeEvent, DirectoryWatcher, NotifyWatcher, WatchFilter};

use common::{SettingsBuilder, init_tracing, wait_for, write_file};

fn filter() -> WatchFilter {
    WatchFilter::new("/project/tmp", vec![".go".into()])
}

fn event(kind: EventKind, path: &str) -> Event {
    Event::new(kind).add_path(PathBuf::from(path))
}

#[test]
fn create_modify_remove_of_watched_files_translate() {
    let root = Path::new("/project");
    let f = filter();

    assert_eq!(
        translate_event(&f, root, &event(EventKind::Create(CreateKind::File), "/project/main.go")),
        vec![ChangeEvent::Created(PathBuf::from("/project/main.go"))]
    );
    assert_eq!(
        translate_event(
            &f,
            root,
            &event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "/project/main.go")
        ),
        vec![ChangeEvent::Modified(PathBuf::from("/project/main.go"))]
    );
    assert_eq!(
        translate_event(&f, root, &event(EventKind::Remove(RemoveKind::File), "/project/main.go")),
        vec![ChangeEvent::Removed(PathBuf::from("/project/main.go"))]
    );
}

#[test]
fn irrelevant_paths_are_dropped() {
    let root = Path::new("/project");
    let f = filter();
    let create = EventKind::Create(CreateKind::File);

    assert!(translate_event(&f, root, &event(create, "/project/README.md")).is_empty());
    assert!(translate_event(&f, root, &event(create, "/project/tmp/main.go")).is_empty());
    assert!(translate_event(&f, root, &event(create, "/project/.git/x.go")).is_empty());
    assert!(translate_event(&f, root, &event(EventKind::Access(AccessKind::Any), "/project/main.go")).is_empty());
}

#[test]
fn new_directories_are_reported_unless_hidden() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("api")).unwrap();
    std::fs::create_dir(dir.path().join(".cache")).unwrap();
    let f = WatchFilter::new(dir.path().join("tmp"), vec![".go".into()]);
    let create = EventKind::Create(CreateKind::Folder);

    let api = dir.path().join("api");
    let ev = Event::new(create).add_path(api.clone());
    assert_eq!(translate_event(&f, dir.path(), &ev), vec![ChangeEvent::Created(api)]);

    let ev = Event::new(create).add_path(dir.path().join(".cache"));
    assert!(translate_event(&f, dir.path(), &ev).is_empty());
}

#[tokio::test]
async fn notify_watcher_reports_new_files() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let settings = SettingsBuilder::new()
        .root(dir.path())
        .output_path(dir.path().join("tmp"))
        .set("watcher", "notify")
        .build();

    let (tx, mut rx) = event_queue(64);
    let (ctx, _failures) = Context::new(Arc::new(settings), Arc::new(RealFileSystem), tx);
    let watcher = NotifyWatcher::new(ctx);
    watcher.watch(dir.path()).unwrap();
    assert_eq!(watcher.watched(), vec![dir.path().to_path_buf()]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let file = dir.path().join("main.go");
    write_file(&file, "package main");

    let ev = wait_for(&mut rx, Duration::from_secs(5), |e| e.path() == Some(file.as_path())).await;
    assert!(matches!(ev, ChangeEvent::Created(_) | ChangeEvent::Modified(_)));

    watcher.shutdown();
    assert!(watcher.watched().is_empty());
}
