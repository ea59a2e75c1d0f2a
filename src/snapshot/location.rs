// src/snapshot/location.rs

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::types::FileKind;

/// Metadata recorded for regular files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Known state of a single location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemLocationSnapshot {
    path: PathBuf,
    kind: FileKind,
    metadata: Option<FileMetadata>,
}

impl FileSystemLocationSnapshot {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileKind::Directory, None)
    }

    pub fn regular_file(path: impl Into<PathBuf>, metadata: FileMetadata) -> Self {
        Self::new(path, FileKind::RegularFile, Some(metadata))
    }

    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileKind::Missing, None)
    }

    /// Entry admitted after a CREATED/MODIFIED event: the location exists,
    /// but nothing about it has been read yet.
    pub fn unverified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileKind::Unverified, None)
    }

    fn new(path: impl Into<PathBuf>, kind: FileKind, metadata: Option<FileMetadata>) -> Self {
        Self {
            path: path.into(),
            kind,
            metadata,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.metadata.as_ref()
    }

    /// Whether entries below this location are consistent with it.
    pub fn may_have_children(&self) -> bool {
        matches!(self.kind, FileKind::Directory | FileKind::Unverified)
    }
}
