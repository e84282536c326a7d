// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{RawSettings, Settings, color_code};
use crate::errors::{DevloopError, Result};
use crate::types::{ShutdownSignal, WatcherKind};

impl TryFrom<RawSettings> for Settings {
    type Error = DevloopError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        let valid_ext = parse_valid_ext(raw.get("valid_ext"))?;
        let build_delay = parse_millis(&raw, "build_delay")?;
        let poll_interval = parse_millis(&raw, "poll_interval")?;
        let shutdown_timeout = parse_millis(&raw, "shutdown_timeout")?;

        if poll_interval.is_zero() {
            return Err(config_error("poll_interval must be >= 1 (got 0)"));
        }

        let shutdown_signal: ShutdownSignal =
            raw.get("shutdown_signal").parse().map_err(DevloopError::ConfigError)?;
        let watcher: WatcherKind = raw.get("watcher").parse().map_err(DevloopError::ConfigError)?;
        let colors = parse_bool(&raw, "colors")?;
        let run_after_build = parse_bool(&raw, "run_after_build")?;

        ensure_non_empty(&raw, "root")?;
        ensure_non_empty(&raw, "output_path")?;
        ensure_non_empty(&raw, "build_name")?;
        ensure_non_empty(&raw, "build_log")?;
        validate_log_colors(&raw)?;

        Ok(Settings::new_unchecked(
            raw.values,
            valid_ext,
            build_delay,
            poll_interval,
            shutdown_timeout,
            shutdown_signal,
            watcher,
            colors,
            run_after_build,
        ))
    }
}

fn config_error(msg: impl Into<String>) -> DevloopError {
    DevloopError::ConfigError(msg.into())
}

/// ".go, .tpl" -> [".go", ".tpl"]
pub fn parse_valid_ext(value: &str) -> Result<Vec<String>> {
    let exts: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();

    if exts.is_empty() {
        return Err(config_error(
            "valid_ext must list at least one extension or file name",
        ));
    }
    Ok(exts)
}

fn parse_millis(raw: &RawSettings, key: &str) -> Result<Duration> {
    let value = raw.get(key).trim();
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| config_error(format!("{key} must be a number of milliseconds, got '{value}': {e}")))
}

fn parse_bool(raw: &RawSettings, key: &str) -> Result<bool> {
    match raw.get(key).trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(config_error(format!(
            "{key} must be a boolean (1/0, true/false), got '{other}'"
        ))),
    }
}

fn ensure_non_empty(raw: &RawSettings, key: &str) -> Result<()> {
    if raw.get(key).trim().is_empty() {
        return Err(config_error(format!("{key} must not be empty")));
    }
    Ok(())
}

fn validate_log_colors(raw: &RawSettings) -> Result<()> {
    for (key, value) in raw.values.iter() {
        if !key.starts_with("log_color_") {
            continue;
        }
        let name = value.trim();
        if !name.is_empty() && color_code(name).is_none() {
            return Err(config_error(format!("{key}: unknown color '{name}'")));
        }
    }
    Ok(())
}
