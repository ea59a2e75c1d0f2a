// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::snapshot::FileMetadata;

pub mod mock;

/// What `stat` found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStat {
    Directory,
    RegularFile(FileMetadata),
}

/// Abstract filesystem interface used for (re-)scanning hierarchies.
pub trait FileSystem: Send + Sync + Debug {
    /// `Ok(None)` when nothing exists at `path`.
    fn stat(&self, path: &Path) -> Result<Option<FileStat>>;

    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> Result<Option<FileStat>> {
        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading metadata of {:?}", path)),
        };

        if meta.is_dir() {
            Ok(Some(FileStat::Directory))
        } else {
            Ok(Some(FileStat::RegularFile(FileMetadata {
                len: meta.len(),
                modified: meta.modified().ok(),
            })))
        }
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}
