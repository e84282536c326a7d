// src/config/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::config::model::{RawSettings, SETTINGS_SECTION, Settings};
use crate::errors::{DevloopError, Result};

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*([^\]]+?)\s*\]$").expect("section regex"));

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_.\-]+)\s*[:=]\s*(.*)$").expect("entry regex"));

/// TOML flavour of the settings file: only the `[Settings]` table is read.
#[derive(Debug, Deserialize)]
struct TomlSettingsFile {
    #[serde(rename = "Settings", default)]
    settings: BTreeMap<String, toml::Value>,
}

/// Load settings the way the binary does at startup:
///
/// 1. built-in defaults,
/// 2. `RUNNER_<KEY>` environment overrides,
/// 3. the `Settings` section of the settings file.
///
/// An explicit path (`-c`) must exist. Without one, the file named by the
/// `config_path` setting is read only if it is present.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    load_settings_with(explicit, |key| std::env::var(key).ok())
}

/// [`load_settings`] with the environment lookup supplied by the caller.
pub fn load_settings_with<F>(explicit: Option<&Path>, env: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut raw = RawSettings::default();
    raw.apply_env_overrides(env);

    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(DevloopError::ConfigNotFound(path.to_path_buf()));
            }
            raw.set("config_path", path.to_string_lossy());
            raw.merge(load_section_from_path(path)?);
        }
        None => {
            let path = Path::new(raw.get("config_path")).to_path_buf();
            if path.is_file() {
                raw.merge(load_section_from_path(&path)?);
            }
        }
    }

    Settings::try_from(raw)
}

/// Read the `Settings` section of a settings file.
///
/// `*.toml` files are parsed as TOML; anything else uses the plain
/// `key: value` format (see [`parse_plain_section`]).
pub fn load_section_from_path(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        parse_toml_section(&contents)
    } else {
        parse_plain_section(&contents, SETTINGS_SECTION)
    }
}

/// Parse the plain settings format:
///
/// ```text
/// # lines before any header belong to [Settings]
/// root:        .
/// build_delay: 200
///
/// [Settings]
/// valid_ext = .go, .html
/// ```
///
/// Returns only the entries of `section`.
pub fn parse_plain_section(contents: &str, section: &str) -> Result<BTreeMap<String, String>> {
    let mut current = SETTINGS_SECTION.to_string();
    let mut entries = BTreeMap::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(caps) = SECTION_RE.captures(line) {
            current = caps[1].to_string();
            continue;
        }

        let Some(caps) = ENTRY_RE.captures(line) else {
            return Err(DevloopError::ConfigError(format!(
                "line {}: expected `key: value` or `[Section]`, got '{}'",
                idx + 1,
                line
            )));
        };

        if current == section {
            entries.insert(caps[1].to_string(), unquote(caps[2].trim()).to_string());
        }
    }

    Ok(entries)
}

fn parse_toml_section(contents: &str) -> Result<BTreeMap<String, String>> {
    let file: TomlSettingsFile = toml::from_str(contents)?;

    file.settings
        .into_iter()
        .map(|(key, value)| {
            let value = toml_value_to_setting(&key, value)?;
            Ok((key, value))
        })
        .collect()
}

fn toml_value_to_setting(key: &str, value: toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(if b { "1" } else { "0" }.to_string()),
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| toml_value_to_setting(key, item))
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.join(", ")),
        other => Err(DevloopError::ConfigError(format!(
            "[Settings].{key}: unsupported value {other}"
        ))),
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
