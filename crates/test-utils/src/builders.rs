#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use devloop::config::{RawSettings, Settings};

/// Builder for `Settings` to simplify test setup.
///
/// Starts from the built-in defaults, with a short build delay and poll
/// interval so tests do not sit around waiting.
pub struct SettingsBuilder {
    raw: RawSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        let mut raw = RawSettings::default();
        raw.set("build_delay", "20");
        raw.set("poll_interval", "25");
        raw.set("colors", "0");
        Self { raw }
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.raw.set(key, value);
        self
    }

    pub fn root(self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_string_lossy().into_owned();
        self.set("root", &root)
    }

    pub fn output_path(self, output: impl AsRef<Path>) -> Self {
        let output = output.as_ref().to_string_lossy().into_owned();
        self.set("output_path", &output)
    }

    pub fn valid_ext(self, exts: &str) -> Self {
        self.set("valid_ext", exts)
    }

    pub fn build_delay(self, delay: Duration) -> Self {
        self.set("build_delay", &delay.as_millis().to_string())
    }

    pub fn poll_interval(self, interval: Duration) -> Self {
        self.set("poll_interval", &interval.as_millis().to_string())
    }

    pub fn shutdown_timeout(self, timeout: Duration) -> Self {
        self.set("shutdown_timeout", &timeout.as_millis().to_string())
    }

    pub fn shutdown_signal(self, signal: &str) -> Self {
        self.set("shutdown_signal", signal)
    }

    pub fn run_after_build(self, val: bool) -> Self {
        self.set("run_after_build", if val { "1" } else { "0" })
    }

    pub fn raw(self) -> RawSettings {
        self.raw
    }

    pub fn build(self) -> Settings {
        Settings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
