//! TreeSnapshot - point-in-time view of a directory tree

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Separator used in relative path keys on every platform.
pub const KEY_SEPARATOR: char = '/';

/// Snapshot of a directory tree.
///
/// Maps each regular file's path relative to the root (always `/`-separated)
/// to its last modification time. A snapshot is never updated once built;
/// rescan the tree to observe changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSnapshot {
    /// Map: relative path → mtime, sorted by path
    entries: BTreeMap<String, SystemTime>,

    /// Root directory the keys are relative to
    pub root_path: PathBuf,

    /// Number of directories walked below the root
    pub total_dirs: usize,

    /// Entries that are neither regular files nor directories (symlinks, sockets, ...)
    pub skipped: Vec<String>,

    /// Scan metadata
    pub scan_duration: Duration,
}

impl TreeSnapshot {
    /// Create an empty snapshot of `root_path`
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            entries: BTreeMap::new(),
            root_path,
            total_dirs: 0,
            skipped: Vec::new(),
            scan_duration: Duration::ZERO,
        }
    }

    pub(crate) fn insert(&mut self, path: String, mtime: SystemTime) {
        self.entries.insert(path, mtime);
    }

    /// Modification time recorded for `path`
    pub fn get(&self, path: &str) -> Option<SystemTime> {
        self.entries.get(path).copied()
    }

    /// Check if a relative path exists in the snapshot
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Return the number of files in the snapshot
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over `(relative path, mtime)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, SystemTime)> {
        self.entries.iter().map(|(path, mtime)| (path.as_str(), *mtime))
    }

    /// Iterator over just the relative paths
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Absolute path of a relative key under this snapshot's root
    pub fn native_path(&self, relative: &str) -> PathBuf {
        join_key(&self.root_path, relative)
    }
}

/// Join a `/`-separated relative key onto `root` using the platform separator.
pub fn join_key(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for part in relative.split(KEY_SEPARATOR).filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}
