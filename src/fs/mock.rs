use super::{DirEntryInfo, FileSystem};
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { contents: Vec<u8>, modified: SystemTime },
    Dir { modified: SystemTime },
}

/// In-memory filesystem with a manual clock.
///
/// Every mutation stamps the entry with the current mock time; `advance`
/// moves the clock so a later `touch` yields a different modification time.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
    clock: Arc<Mutex<SystemTime>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &Path) -> anyhow::Error {
    anyhow::Error::new(io::Error::new(
        io::ErrorKind::NotFound,
        format!("not found: {:?}", path),
    ))
}

impl MockFileSystem {
    pub fn new() -> Self {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let mut entries = BTreeMap::new();
        // Ensure root exists
        entries.insert(PathBuf::from("."), MockEntry::Dir { modified: start });

        Self {
            entries: Arc::new(Mutex::new(entries)),
            clock: Arc::new(Mutex::new(start)),
        }
    }

    fn now(&self) -> SystemTime {
        *self.clock.lock().unwrap()
    }

    /// Move the mock clock forward.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.lock().unwrap();
        *clock += by;
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let modified = self.now();
        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut entries, parent, modified);
        }
        entries.insert(
            path,
            MockEntry::File {
                contents: content.into(),
                modified,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let modified = self.now();
        let mut entries = self.entries.lock().unwrap();
        ensure_dirs(&mut entries, path.as_ref(), modified);
    }

    /// Bump the modification time of an existing entry to the current clock.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let now = self.now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified, .. }) | Some(MockEntry::Dir { modified }) => {
                *modified = now;
            }
            None => {}
        }
    }

    /// Remove an entry and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|p, _| !p.starts_with(path));
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path.as_ref()) {
            Some(MockEntry::File { contents, .. }) => Some(contents.clone()),
            _ => None,
        }
    }
}

fn ensure_dirs(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path, modified: SystemTime) {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir { modified });
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File { contents, .. }) => {
                String::from_utf8(contents.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir { .. }) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File { .. }) => {
                entries.remove(path);
                Ok(())
            }
            Some(MockEntry::Dir { .. }) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(not_found(path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        entries.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntryInfo>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir { .. }) => {}
            Some(MockEntry::File { .. }) => return Err(anyhow!("Not a directory: {:?}", path)),
            None => return Err(not_found(path)),
        }

        let children = entries
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .filter_map(|(p, entry)| {
                let name = p.file_name()?.to_string_lossy().into_owned();
                let (is_dir, modified) = match entry {
                    MockEntry::File { modified, .. } => (false, *modified),
                    MockEntry::Dir { modified } => (true, *modified),
                };
                Some(DirEntryInfo {
                    name,
                    is_dir,
                    modified,
                })
            })
            .collect();

        Ok(children)
    }
}
