// src/watch/filter.rs

//! Which paths are relevant to a rebuild.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::watch::path_utils::{absolute, dotted_extension, is_hidden_name};

/// File filter shared by every watcher task.
///
/// A file is *watched* when it is outside the build output directory and its
/// extension (or, if it has none, its whole name) is whitelisted. Directories
/// are *descended* into unless they are hidden or the output directory.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    output_dir: PathBuf,
    valid_ext: Vec<String>,
}

impl WatchFilter {
    pub fn new(output_dir: impl AsRef<Path>, valid_ext: Vec<String>) -> Self {
        Self {
            output_dir: absolute(output_dir.as_ref()),
            valid_ext,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.output_path(), settings.valid_extensions().to_vec())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// True if `path` is the output directory or lies inside it.
    pub fn is_output_path(&self, path: &Path) -> bool {
        absolute(path).starts_with(&self.output_dir)
    }

    /// True if a change to the file at `path` should trigger a rebuild.
    pub fn is_watched_file(&self, path: &Path) -> bool {
        if self.is_output_path(path) {
            return false;
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        let ext = dotted_extension(&name);

        self.valid_ext
            .iter()
            .any(|valid| valid == ext || (ext.is_empty() && valid.as_str() == name))
    }

    /// True if the watcher should poll this directory.
    pub fn should_descend(&self, dir: &Path) -> bool {
        let hidden = dir
            .file_name()
            .is_some_and(|n| is_hidden_name(&n.to_string_lossy()));
        !hidden && !self.is_output_path(dir)
    }

    /// True if `path` sits under a hidden directory (relative to `root`) or
    /// in the output directory. Used by watchers that see a whole tree at once.
    pub fn is_ignored_path(&self, root: &Path, path: &Path) -> bool {
        if self.is_output_path(path) {
            return true;
        }
        let abs = absolute(path);
        let rel = abs.strip_prefix(absolute(root)).unwrap_or(&abs);
        let mut parents = rel.components().collect::<Vec<_>>();
        // The file itself may be a dotfile; only its directories are skipped.
        parents.pop();
        parents
            .iter()
            .any(|c| is_hidden_name(&c.as_os_str().to_string_lossy()))
    }
}
