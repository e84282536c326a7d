// tests/builder_process.rs

#![cfg(unix)]

mod common;

use std::path::PathBuf;

use devloop::exec::{BuildBackend, BuildResult, CommandBuilder};

use common::{SettingsBuilder, init_tracing, with_timeout};

#[tokio::test]
async fn zero_exit_is_success() {
    init_tracing();
    let builder = CommandBuilder::new("sh", ["-c", "echo building; exit 0"]);
    let result = with_timeout(builder.run()).await.unwrap();
    assert_eq!(result, BuildResult::Success);
}

#[tokio::test]
async fn non_zero_exit_captures_all_of_stderr() {
    init_tracing();
    let mut builder = CommandBuilder::new(
        "sh",
        ["-c", "echo 'a.go:1: one' >&2; echo 'b.go:2: two' >&2; exit 2"],
    );
    let result = with_timeout(builder.build()).await.unwrap();
    assert_eq!(result, BuildResult::Failure("a.go:1: one\nb.go:2: two\n".to_string()));
    assert!(!result.is_success());
}

#[tokio::test]
async fn stderr_alone_does_not_mean_failure() {
    init_tracing();
    let builder = CommandBuilder::new("sh", ["-c", "echo 'warning: deprecated' >&2"]);
    let result = with_timeout(builder.run()).await.unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn missing_compiler_is_an_error() {
    init_tracing();
    let builder = CommandBuilder::new("definitely-not-a-compiler-4242", Vec::<String>::new());
    let err = with_timeout(builder.run()).await.unwrap_err();
    assert!(err.to_string().contains("definitely-not-a-compiler-4242"), "{err}");
}

#[test]
fn go_build_command_comes_from_settings() {
    let settings = SettingsBuilder::new()
        .root("./cmd/server")
        .output_path("./out")
        .set("build_name", "server")
        .build();

    let builder = CommandBuilder::from_settings(&settings);

    assert_eq!(builder.program(), "go");
    let out = PathBuf::from("./out").join("server");
    assert_eq!(
        builder.args(),
        ["build", "-o", out.to_str().unwrap(), "./cmd/server"]
    );
}
