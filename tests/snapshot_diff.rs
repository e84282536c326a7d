// tests/snapshot_diff.rs

use std::path::Path;
use std::time::Duration;

use devloop::errors::is_not_found;
use devloop::fs::mock::MockFileSystem;
use devloop::watch::{DirectorySnapshot, EntryChange};

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("proj/main.go", "package main");
    fs.add_file("proj/README.md", "# hi");
    fs.add_dir("proj/pkg");
    fs
}

#[test]
fn snapshot_lists_direct_children_only() {
    let fs = project();
    fs.add_file("proj/pkg/util.go", "package pkg");

    let snapshot = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();

    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.get("main.go").is_some_and(|s| !s.is_dir));
    assert!(snapshot.get("pkg").is_some_and(|s| s.is_dir));
    assert!(snapshot.get("util.go").is_none());
    assert_eq!(snapshot.subdirectories().collect::<Vec<_>>(), ["pkg"]);
}

#[test]
fn unchanged_directory_has_no_diff() {
    let fs = project();
    let before = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();
    let after = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();
    assert!(before.diff(&after).is_empty());
}

#[test]
fn diff_reports_created_modified_and_removed() {
    let fs = project();
    let before = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();

    fs.advance(Duration::from_secs(1));
    fs.touch("proj/main.go");
    fs.add_file("proj/handler.go", "package main");
    fs.remove("proj/README.md");

    let after = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();
    let changes = before.diff(&after);

    assert_eq!(
        changes,
        vec![
            EntryChange::Created {
                name: "handler.go".into(),
                is_dir: false
            },
            EntryChange::Modified {
                name: "main.go".into(),
                is_dir: false
            },
            EntryChange::Removed {
                name: "README.md".into(),
                is_dir: false
            },
        ]
    );
}

#[test]
fn sub_second_modifications_are_detected() {
    let fs = project();
    let before = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();

    fs.advance(Duration::from_millis(10));
    fs.touch("proj/main.go");

    let after = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();
    let changes = before.diff(&after);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].name(), "main.go");
}

#[test]
fn removed_directory_is_flagged_as_directory() {
    let fs = project();
    let before = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();

    fs.remove("proj/pkg");

    let after = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();
    let changes = before.diff(&after);
    assert_eq!(changes.len(), 1);
    assert!(changes[0].is_dir());
    assert!(matches!(changes[0], EntryChange::Removed { .. }));
}

#[test]
fn reading_a_missing_directory_is_not_found() {
    let fs = project();
    fs.remove("proj/pkg");

    let err = DirectorySnapshot::read(&fs, Path::new("proj/pkg")).unwrap_err();
    assert!(is_not_found(&err));
}

#[test]
fn file_replaced_by_directory_is_a_modification_even_with_equal_mtime() {
    let fs = project();
    fs.add_file("proj/api", "not a directory yet");
    let before = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();

    fs.remove("proj/api");
    fs.add_dir("proj/api");

    let after = DirectorySnapshot::read(&fs, Path::new("proj")).unwrap();
    assert_eq!(
        before.diff(&after),
        vec![EntryChange::Modified {
            name: "api".into(),
            is_dir: true
        }]
    );
}
