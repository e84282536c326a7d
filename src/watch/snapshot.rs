// src/watch/snapshot.rs

use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

use anyhow::Result;

use crate::fs::{DirEntryInfo, FileSystem};

/// What the watcher remembers about one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStamp {
    pub is_dir: bool,
    pub modified: SystemTime,
}

/// Listing of a single directory, keyed by entry name.
///
/// Owned by exactly one poll task. Never patched in place: when anything
/// changes, the task swaps in the listing it just read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    entries: BTreeMap<String, EntryStamp>,
}

/// A single difference between two snapshots of the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryChange {
    Created { name: String, is_dir: bool },
    Modified { name: String, is_dir: bool },
    Removed { name: String, is_dir: bool },
}

impl EntryChange {
    pub fn name(&self) -> &str {
        match self {
            EntryChange::Created { name, .. }
            | EntryChange::Modified { name, .. }
            | EntryChange::Removed { name, .. } => name,
        }
    }

    pub fn is_dir(&self) -> bool {
        match self {
            EntryChange::Created { is_dir, .. }
            | EntryChange::Modified { is_dir, .. }
            | EntryChange::Removed { is_dir, .. } => *is_dir,
        }
    }
}

impl DirectorySnapshot {
    pub fn from_entries(entries: impl IntoIterator<Item = DirEntryInfo>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| {
                (
                    e.name,
                    EntryStamp {
                        is_dir: e.is_dir,
                        modified: e.modified,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Read `dir` through `fs`.
    pub fn read(fs: &dyn FileSystem, dir: &Path) -> Result<Self> {
        Ok(Self::from_entries(fs.read_dir(dir)?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&EntryStamp> {
        self.entries.get(name)
    }

    /// Names of the subdirectories in this listing.
    pub fn subdirectories(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, stamp)| stamp.is_dir)
            .map(|(name, _)| name.as_str())
    }

    /// Changes needed to get from `self` to `current`.
    ///
    /// Created and modified entries come first (in name order), removals
    /// last, which is the order the watcher reports them in.
    pub fn diff(&self, current: &DirectorySnapshot) -> Vec<EntryChange> {
        let mut changes = Vec::new();

        for (name, now) in current.entries.iter() {
            match self.entries.get(name) {
                None => changes.push(EntryChange::Created {
                    name: name.clone(),
                    is_dir: now.is_dir,
                }),
                Some(prev) if prev.modified != now.modified || prev.is_dir != now.is_dir => {
                    changes.push(EntryChange::Modified {
                        name: name.clone(),
                        is_dir: now.is_dir,
                    })
                }
                Some(_) => {}
            }
        }

        for (name, prev) in self.entries.iter() {
            if !current.entries.contains_key(name) {
                changes.push(EntryChange::Removed {
                    name: name.clone(),
                    is_dir: prev.is_dir,
                });
            }
        }

        changes
    }
}
