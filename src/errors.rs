// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevloopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Can't find config file `{}`", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("initial build failed; no previous instance to fall back to")]
    InitialBuildFailed,

    #[error("watching {} failed: {message}", .path.display())]
    WatchFailed { path: PathBuf, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DevloopError>;

/// True if `err` (or anything it wraps) is an `io::Error` of kind `NotFound`.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    has_io_kind(err, io::ErrorKind::NotFound)
}

/// True if `err` wraps an `io::Error` of kind `NotADirectory`, e.g. a watched
/// directory that was replaced by a file.
pub fn is_not_a_directory(err: &anyhow::Error) -> bool {
    has_io_kind(err, io::ErrorKind::NotADirectory)
}

fn has_io_kind(err: &anyhow::Error, kind: io::ErrorKind) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == kind)
    })
}
