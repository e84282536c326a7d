// tests/watch_filter.rs

mod common;

use std::path::{Path, PathBuf};

use proptest::prelude::*;

use devloop::watch::WatchFilter;
use devloop::watch::path_utils::{dotted_extension, is_hidden_name, normalize};

use common::SettingsBuilder;

fn go_filter() -> WatchFilter {
    WatchFilter::new(
        "/project/tmp",
        vec![".go".into(), ".tmpl".into(), "Makefile".into()],
    )
}

#[test]
fn whitelisted_extensions_are_watched() {
    let filter = go_filter();
    assert!(filter.is_watched_file(Path::new("/project/main.go")));
    assert!(filter.is_watched_file(Path::new("/project/views/index.tmpl")));
    assert!(!filter.is_watched_file(Path::new("/project/README.md")));
    assert!(!filter.is_watched_file(Path::new("/project/main.go.swp")));
}

#[test]
fn extensionless_files_match_by_full_name() {
    let filter = go_filter();
    assert!(filter.is_watched_file(Path::new("/project/Makefile")));
    assert!(!filter.is_watched_file(Path::new("/project/Dockerfile")));
}

#[test]
fn output_directory_is_never_watched() {
    let filter = go_filter();
    assert!(!filter.is_watched_file(Path::new("/project/tmp/main.go")));
    assert!(!filter.is_watched_file(Path::new("/project/tmp/nested/x.go")));
    assert!(!filter.should_descend(Path::new("/project/tmp")));
    // Prefix of the name only, not a path component.
    assert!(filter.is_watched_file(Path::new("/project/tmpl/main.go")));
    assert!(filter.should_descend(Path::new("/project/tmpl")));
}

#[test]
fn hidden_directories_are_not_descended() {
    let filter = go_filter();
    assert!(!filter.should_descend(Path::new("/project/.git")));
    assert!(!filter.should_descend(Path::new("/project/src/.cache")));
    assert!(filter.should_descend(Path::new("/project/src")));
}

#[test]
fn ignored_paths_include_anything_under_a_dot_directory() {
    let filter = go_filter();
    let root = Path::new("/project");
    assert!(filter.is_ignored_path(root, Path::new("/project/.git/hooks/x.go")));
    assert!(filter.is_ignored_path(root, Path::new("/project/tmp/x.go")));
    assert!(!filter.is_ignored_path(root, Path::new("/project/.env.go")));
    assert!(!filter.is_ignored_path(root, Path::new("/project/pkg/x.go")));
}

#[test]
fn relative_output_path_from_settings_is_resolved() {
    let settings = SettingsBuilder::new().output_path("./build/out").build();
    let filter = WatchFilter::from_settings(&settings);

    let cwd = std::env::current_dir().unwrap();
    assert_eq!(filter.output_dir(), cwd.join("build/out"));
    assert!(!filter.is_watched_file(&cwd.join("build/out/main.go")));
    assert!(filter.is_watched_file(&cwd.join("build/main.go")));
}

#[test]
fn dotted_extension_follows_last_dot() {
    assert_eq!(dotted_extension("main.go"), ".go");
    assert_eq!(dotted_extension("archive.tar.gz"), ".gz");
    assert_eq!(dotted_extension(".bashrc"), ".bashrc");
    assert_eq!(dotted_extension("Makefile"), "");
}

#[test]
fn hidden_names() {
    assert!(is_hidden_name(".git"));
    assert!(!is_hidden_name("."));
    assert!(!is_hidden_name(".."));
    assert!(!is_hidden_name("src"));
}

#[test]
fn normalize_folds_dots() {
    assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
}

proptest! {
    #[test]
    fn nothing_inside_output_dir_is_watched(
        segments in proptest::collection::vec("[a-z]{1,8}", 0..4),
        stem in "[a-z]{1,8}",
    ) {
        let filter = go_filter();
        let mut path = PathBuf::from("/project/tmp");
        for s in &segments {
            path.push(s);
        }
        path.push(format!("{stem}.go"));
        prop_assert!(!filter.is_watched_file(&path));
    }

    #[test]
    fn watched_iff_extension_whitelisted(
        dir in "[a-z]{1,8}",
        stem in "[a-z]{1,8}",
        ext in prop_oneof![Just("go"), Just("tmpl"), Just("md"), Just("rs"), Just("html")],
    ) {
        prop_assume!(dir != "tmp");
        let filter = go_filter();
        let path = PathBuf::from(format!("/project/{dir}/{stem}.{ext}"));
        let expected = ext == "go" || ext == "tmpl";
        prop_assert_eq!(filter.is_watched_file(&path), expected);
    }
}
