// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against the current directory and fold `.` / `..`
/// components lexically. Symlinks are not resolved.
pub fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };
    normalize(&joined)
}

/// Lexically normalize a path: drop `.`, resolve `..` against the preceding
/// component.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Extension the way the whitelist understands it: everything from the last
/// `.` of the file name, dot included. `".bashrc"` -> `".bashrc"`,
/// `"Makefile"` -> `""`.
pub fn dotted_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

/// True for dotfiles and dot-directories (`.git`, `.env`), never for `.`/`..`.
pub fn is_hidden_name(name: &str) -> bool {
    name.len() > 1 && name.starts_with('.') && name != ".."
}
