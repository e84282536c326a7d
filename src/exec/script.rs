// src/exec/script.rs

//! Pre/post-build hook scripts.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::exec::command::run_with_captured_stderr;

/// How many leading lines are searched for a `#!` line.
const SHEBANG_SCAN_LINES: usize = 4;

/// A hook script named in the settings. An empty path means "no script".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    path: PathBuf,
}

/// Result of running a script: captured stderr (or the error that prevented
/// it from running) and whether it exited successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRun {
    pub output: String,
    pub success: bool,
}

impl ScriptRun {
    fn failed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: false,
        }
    }
}

impl Script {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when a script is configured (not whether the file is on disk).
    pub fn exists(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }

    /// Interpreter directive from the first few lines, without the `#!`.
    pub fn shebang(&self) -> io::Result<Option<String>> {
        let file = File::open(&self.path)?;
        Ok(find_shebang(BufReader::new(file)))
    }

    /// Program and arguments used to run this script.
    pub fn command_line(&self) -> io::Result<Vec<String>> {
        let script = self.path.to_string_lossy().into_owned();
        let mut command: Vec<String> = match self.shebang()? {
            Some(shebang) => shebang.split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect(),
            None => Vec::new(),
        };
        command.push(script);
        Ok(command)
    }

    /// Run the script. Never fails; problems end up in `ScriptRun::output`.
    pub async fn run(&self) -> ScriptRun {
        let command = match self.command_line() {
            Ok(c) => c,
            Err(e) => return ScriptRun::failed(e.to_string()),
        };
        debug!(?command, "running script");

        let mut cmd = Command::new(&command[0]);
        cmd.args(&command[1..]);

        let what = format!("script {}", self.path.display());
        match run_with_captured_stderr(cmd, &what).await {
            Ok(run) if run.status.success() => ScriptRun {
                output: String::new(),
                success: true,
            },
            Ok(run) => ScriptRun::failed(run.stderr),
            Err(e) => ScriptRun::failed(format!("{e:#}")),
        }
    }
}

/// Scan up to four lines for `#!interpreter args`. Lines are trimmed of
/// spaces and tabs first; reading stops at the first unreadable line.
pub fn find_shebang(reader: impl BufRead) -> Option<String> {
    for line in reader.lines().take(SHEBANG_SCAN_LINES) {
        let Ok(line) = line else {
            break;
        };
        let line = line.trim_matches(|c| c == ' ' || c == '\t');
        if let Some(rest) = line.strip_prefix("#!") {
            return Some(rest.trim_matches(|c| c == ' ' || c == '\t').to_string());
        }
    }
    None
}
