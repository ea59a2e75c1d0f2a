#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use vfswatch::snapshot::{FileMetadata, FileSystemLocationSnapshot, SnapshotHierarchy};

/// Builder for `SnapshotHierarchy` to simplify test setup.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    entries: Vec<FileSystemLocationSnapshot>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(mut self, path: impl AsRef<Path>) -> Self {
        self.entries
            .push(FileSystemLocationSnapshot::directory(path.as_ref()));
        self
    }

    /// A regular file of `len` bytes with a fixed modification time.
    pub fn file(mut self, path: impl AsRef<Path>, len: u64) -> Self {
        let meta = FileMetadata {
            len,
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1)),
        };
        self.entries
            .push(FileSystemLocationSnapshot::regular_file(path.as_ref(), meta));
        self
    }

    pub fn missing(mut self, path: impl AsRef<Path>) -> Self {
        self.entries
            .push(FileSystemLocationSnapshot::missing(path.as_ref()));
        self
    }

    /// The entries collected so far, e.g. to pass as an `added` batch.
    pub fn entries(&self) -> Vec<FileSystemLocationSnapshot> {
        self.entries.clone()
    }

    pub fn build(self) -> SnapshotHierarchy {
        SnapshotHierarchy::from_entries(self.entries)
    }
}

/// Shorthand for a list of paths.
pub fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}
