// src/snapshot/scan.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::{FileStat, FileSystem};
use crate::snapshot::FileSystemLocationSnapshot;

/// Snapshot everything at and below `root`.
///
/// A missing `root` yields a single `Missing` entry, so that the caller still
/// records "known not to exist". Entries that vanish mid-walk are skipped.
pub fn snapshot_directory(fs: &dyn FileSystem, root: &Path) -> Result<Vec<FileSystemLocationSnapshot>> {
    let mut out = Vec::new();
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(path) = stack.pop() {
        match fs.stat(&path)? {
            None if path == root => out.push(FileSystemLocationSnapshot::missing(&path)),
            None => {
                debug!(?path, "entry vanished while scanning; skipping");
            }
            Some(FileStat::RegularFile(meta)) => {
                out.push(FileSystemLocationSnapshot::regular_file(&path, meta));
            }
            Some(FileStat::Directory) => {
                out.push(FileSystemLocationSnapshot::directory(&path));
                let mut children = fs.read_dir(&path)?;
                children.sort();
                // Reverse so the stack pops in sorted order.
                stack.extend(children.into_iter().rev());
            }
        }
    }

    debug!(root = ?root, entries = out.len(), "scanned directory");
    Ok(out)
}
