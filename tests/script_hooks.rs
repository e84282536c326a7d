// tests/script_hooks.rs

mod common;

use std::io::Cursor;

use tempfile::TempDir;

use devloop::exec::{Script, find_shebang};

use common::{SettingsBuilder, init_tracing, with_timeout, write_file};

#[test]
fn shebang_on_first_line() {
    let found = find_shebang(Cursor::new("#!/bin/sh -e\necho hi\n"));
    assert_eq!(found.as_deref(), Some("/bin/sh -e"));
}

#[test]
fn shebang_is_found_within_four_lines_after_trimming() {
    let found = find_shebang(Cursor::new("\n# generated\n\t  #!  /usr/bin/env bash \necho\n"));
    assert_eq!(found.as_deref(), Some("/usr/bin/env bash"));
}

#[test]
fn shebang_past_fourth_line_is_ignored() {
    let found = find_shebang(Cursor::new("a\nb\nc\nd\n#!/bin/sh\n"));
    assert_eq!(found, None);
}

#[test]
fn unset_script_does_not_exist() {
    let settings = SettingsBuilder::new().build();
    assert!(!settings.pre_build_script().exists());

    let settings = SettingsBuilder::new().set("post_build_script", "hooks/post.sh").build();
    let script = settings.post_build_script();
    assert!(script.exists());
    assert_eq!(script.path().to_str(), Some("hooks/post.sh"));
}

#[test]
fn command_line_prepends_interpreter() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pre.sh");
    write_file(&path, "#!/bin/sh -eu\nexit 0\n");

    let command = Script::new(&path).command_line().unwrap();
    assert_eq!(
        command,
        vec![
            "/bin/sh".to_string(),
            "-eu".to_string(),
            path.to_string_lossy().into_owned()
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn successful_script_reports_success() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("ran");
    let path = dir.path().join("pre.sh");
    write_file(&path, &format!("#!/bin/sh\ntouch '{}'\n", marker.display()));

    let run = with_timeout(Script::new(&path).run()).await;

    assert!(run.success, "output: {}", run.output);
    assert!(run.output.is_empty());
    assert!(marker.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn failing_script_returns_its_stderr() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("post.sh");
    write_file(&path, "#!/bin/sh\necho 'migration failed' >&2\nexit 1\n");

    let run = with_timeout(Script::new(&path).run()).await;

    assert!(!run.success);
    assert_eq!(run.output, "migration failed\n");
}

#[tokio::test]
async fn missing_script_is_folded_into_the_result() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    let run = with_timeout(Script::new(dir.path().join("absent.sh")).run()).await;

    assert!(!run.success);
    assert!(!run.output.is_empty());
}
