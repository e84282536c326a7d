// src/exec/builder.rs

//! Compiler invocation.

use std::future::Future;
use std::pin::Pin;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Settings;
use crate::errors::Result;
use crate::exec::backend::BuildBackend;
use crate::exec::command::run_with_captured_stderr;

/// Outcome of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResult {
    Success,
    /// Everything the compiler wrote to stderr.
    Failure(String),
}

impl BuildResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success)
    }
}

/// Builds the artifact by running an external compiler command.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
}

impl CommandBuilder {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `go build -o <output_path>/<build_name> <root>`
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            "go",
            [
                "build".to_string(),
                "-o".to_string(),
                settings.build_path().to_string_lossy().into_owned(),
                settings.root().to_string_lossy().into_owned(),
            ],
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the compiler once. Success is decided by its exit status alone.
    pub async fn run(&self) -> Result<BuildResult> {
        info!(program = %self.program, args = ?self.args, "Building...");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        let run = run_with_captured_stderr(cmd, &format!("build command '{}'", self.program)).await?;

        debug!(code = ?run.status.code(), "build command exited");
        if run.status.success() {
            Ok(BuildResult::Success)
        } else {
            Ok(BuildResult::Failure(run.stderr))
        }
    }
}

impl BuildBackend for CommandBuilder {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = Result<BuildResult>> + Send + '_>> {
        Box::pin(self.run())
    }
}
