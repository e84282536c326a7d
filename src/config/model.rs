// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::exec::script::Script;
use crate::types::{ShutdownSignal, WatcherKind};

/// Name of the section whose keys override the built-in defaults.
pub const SETTINGS_SECTION: &str = "Settings";

/// Prefix used both for environment overrides (`RUNNER_ROOT=...`) and for the
/// variables exported to the child process.
pub const ENV_SETTINGS_PREFIX: &str = "RUNNER_";

/// Built-in defaults. Every key a settings file may override is listed here.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("config_path", "./runner.conf"),
    ("root", "."),
    ("output_path", "./tmp"),
    ("build_name", "runner-build"),
    ("build_log", "runner-build-errors.log"),
    ("valid_ext", ".go, .tpl, .tmpl, .html"),
    ("build_delay", "600"),
    ("poll_interval", "500"),
    ("shutdown_timeout", "5000"),
    ("shutdown_signal", "TERM"),
    ("run_after_build", "1"),
    ("watcher", "poll"),
    ("colors", "1"),
    ("log_color_main", "cyan"),
    ("log_color_build", "yellow"),
    ("log_color_runner", "green"),
    ("log_color_watcher", "magenta"),
    ("log_color_app", ""),
    ("pre_build_script", ""),
    ("post_build_script", ""),
];

/// Color names accepted by `log_color_<component>`, with their ANSI SGR codes.
pub const COLORS: &[(&str, &str)] = &[
    ("reset", "0"),
    ("black", "30"),
    ("red", "31"),
    ("green", "32"),
    ("yellow", "33"),
    ("blue", "34"),
    ("magenta", "35"),
    ("cyan", "36"),
    ("white", "37"),
    ("bold_black", "30;1"),
    ("bold_red", "31;1"),
    ("bold_green", "32;1"),
    ("bold_yellow", "33;1"),
    ("bold_blue", "34;1"),
    ("bold_magenta", "35;1"),
    ("bold_cyan", "36;1"),
    ("bold_white", "37;1"),
    ("bright_black", "30;2"),
    ("bright_red", "31;2"),
    ("bright_green", "32;2"),
    ("bright_yellow", "33;2"),
    ("bright_blue", "34;2"),
    ("bright_magenta", "35;2"),
    ("bright_cyan", "36;2"),
    ("bright_white", "37;2"),
];

pub fn color_code(name: &str) -> Option<&'static str> {
    COLORS
        .iter()
        .find(|(color, _)| *color == name)
        .map(|(_, code)| *code)
}

/// Settings as they are being assembled (defaults, then environment, then
/// file). Nothing here is validated yet; see [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSettings {
    pub values: BTreeMap<String, String>,
}

impl Default for RawSettings {
    fn default() -> Self {
        let values = DEFAULT_SETTINGS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { values }
    }
}

impl RawSettings {
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overwrite keys with the entries of a settings section.
    pub fn merge<I, K, V>(&mut self, section: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in section {
            self.set(k, v);
        }
    }

    /// Apply `RUNNER_<KEY>` overrides for every known key.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure over a
    /// map instead of touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let keys: Vec<String> = self.values.keys().cloned().collect();
        for key in keys {
            let var = env_var_name(&key);
            if let Some(value) = lookup(&var) {
                self.values.insert(key, value);
            }
        }
    }
}

/// `build_delay` -> `RUNNER_BUILD_DELAY`.
pub fn env_var_name(key: &str) -> String {
    format!("{ENV_SETTINGS_PREFIX}{key}").to_uppercase()
}

/// Validated, immutable settings.
///
/// Construct through `Settings::try_from(RawSettings)` (see `validate.rs`), or
/// [`crate::config::load_settings`].
#[derive(Debug, Clone)]
pub struct Settings {
    values: BTreeMap<String, String>,
    valid_ext: Vec<String>,
    build_delay: Duration,
    poll_interval: Duration,
    shutdown_timeout: Duration,
    shutdown_signal: ShutdownSignal,
    watcher: WatcherKind,
    colors: bool,
    run_after_build: bool,
}

impl Settings {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_unchecked(
        values: BTreeMap<String, String>,
        valid_ext: Vec<String>,
        build_delay: Duration,
        poll_interval: Duration,
        shutdown_timeout: Duration,
        shutdown_signal: ShutdownSignal,
        watcher: WatcherKind,
        colors: bool,
        run_after_build: bool,
    ) -> Self {
        Self {
            values,
            valid_ext,
            build_delay,
            poll_interval,
            shutdown_timeout,
            shutdown_signal,
            watcher,
            colors,
            run_after_build,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// All key/value pairs, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn path(&self, key: &str) -> PathBuf {
        PathBuf::from(self.get(key).unwrap_or_default())
    }

    pub fn root(&self) -> PathBuf {
        self.path("root")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path("config_path")
    }

    pub fn output_path(&self) -> PathBuf {
        self.path("output_path")
    }

    pub fn build_name(&self) -> &str {
        self.get("build_name").unwrap_or_default()
    }

    /// Where the compiled artifact is written and launched from.
    pub fn build_path(&self) -> PathBuf {
        self.output_path().join(self.build_name())
    }

    pub fn build_errors_file_name(&self) -> &str {
        self.get("build_log").unwrap_or_default()
    }

    pub fn build_errors_path(&self) -> PathBuf {
        self.output_path().join(self.build_errors_file_name())
    }

    /// Whitelisted extensions (".go") or exact file names ("Makefile").
    pub fn valid_extensions(&self) -> &[String] {
        &self.valid_ext
    }

    pub fn build_delay(&self) -> Duration {
        self.build_delay
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown_signal
    }

    pub fn watcher_kind(&self) -> WatcherKind {
        self.watcher
    }

    pub fn colors_enabled(&self) -> bool {
        self.colors
    }

    pub fn run_after_build(&self) -> bool {
        self.run_after_build
    }

    /// ANSI code for a log component, if one is configured.
    pub fn log_color(&self, component: &str) -> Option<&'static str> {
        let name = self.get(&format!("log_color_{component}"))?;
        color_code(name.trim())
    }

    pub fn pre_build_script(&self) -> Script {
        Script::new(self.get("pre_build_script").unwrap_or_default())
    }

    pub fn post_build_script(&self) -> Script {
        Script::new(self.get("post_build_script").unwrap_or_default())
    }
}
