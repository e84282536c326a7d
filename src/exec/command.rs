// src/exec/command.rs

use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// What a short-lived command left behind.
#[derive(Debug)]
pub struct CapturedRun {
    pub status: ExitStatus,
    pub stderr: String,
}

/// Run `cmd` to completion with stdout passed through to our own stdout and
/// stderr captured in full.
///
/// Only a failure to spawn or wait is an `Err`; a non-zero exit is reported
/// through `CapturedRun::status`.
pub async fn run_with_captured_stderr(mut cmd: Command, what: &str) -> Result<CapturedRun> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning {what}"))?;

    let mut buf = Vec::new();
    if let Some(mut stderr) = child.stderr.take() {
        stderr
            .read_to_end(&mut buf)
            .await
            .with_context(|| format!("reading stderr of {what}"))?;
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for {what}"))?;

    Ok(CapturedRun {
        status,
        stderr: String::from_utf8_lossy(&buf).into_owned(),
    })
}
