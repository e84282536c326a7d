use std::fmt;
use std::str::FromStr;

/// Signal delivered to the running instance when it has to make room for a
/// fresh build.
///
/// - `Term`: ask the process to shut down (default).
/// - `Kill`: terminate it immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShutdownSignal {
    #[default]
    Term,
    Kill,
}

impl ShutdownSignal {
    /// Name as accepted by `kill -<NAME>` / `pkill -<NAME>`.
    pub fn name(self) -> &'static str {
        match self {
            ShutdownSignal::Term => "TERM",
            ShutdownSignal::Kill => "KILL",
        }
    }

    #[cfg(unix)]
    pub fn as_raw(self) -> libc::c_int {
        match self {
            ShutdownSignal::Term => libc::SIGTERM,
            ShutdownSignal::Kill => libc::SIGKILL,
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShutdownSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().trim_start_matches("SIG") {
            "TERM" => Ok(ShutdownSignal::Term),
            "KILL" => Ok(ShutdownSignal::Kill),
            other => Err(format!(
                "invalid shutdown_signal: {other} (expected \"TERM\" or \"KILL\")"
            )),
        }
    }
}

/// Which `DirectoryWatcher` implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatcherKind {
    /// Poll every directory and diff snapshots.
    #[default]
    Poll,
    /// OS notifications via the `notify` crate.
    Notify,
}

impl FromStr for WatcherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "poll" | "polling" => Ok(WatcherKind::Poll),
            "notify" | "inotify" => Ok(WatcherKind::Notify),
            other => Err(format!(
                "invalid watcher: {other} (expected \"poll\" or \"notify\")"
            )),
        }
    }
}
