// src/config/mod.rs

//! Settings loading and validation for devloop.
//!
//! Responsibilities:
//! - Define the flat key/value settings model and its defaults (`model.rs`).
//! - Read a settings file and environment overrides (`loader.rs`).
//! - Turn the raw map into typed, validated [`Settings`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_section_from_path, load_settings, load_settings_with, parse_plain_section};
pub use model::{
    DEFAULT_SETTINGS, ENV_SETTINGS_PREFIX, RawSettings, SETTINGS_SECTION, Settings, env_var_name,
};
