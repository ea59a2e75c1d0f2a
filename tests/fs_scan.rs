// tests/fs_scan.rs

use std::fs;
use std::path::PathBuf;

use vfswatch::fs::{FileStat, FileSystem, RealFileSystem};
use vfswatch::snapshot::{snapshot_directory, SnapshotHierarchy};
use vfswatch::types::FileKind;

#[test]
fn real_filesystem_scan_matches_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::write(root.join("src/lib.rs"), b"pub fn x() {}").unwrap();
    fs::write(root.join("src/nested/mod.rs"), b"").unwrap();

    let entries = snapshot_directory(&RealFileSystem, &root).unwrap();
    let snapshot = SnapshotHierarchy::from_entries(entries);

    let rel: Vec<PathBuf> = snapshot
        .paths()
        .into_iter()
        .map(|p| p.strip_prefix(&root).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        rel,
        vec![
            PathBuf::from(""),
            PathBuf::from("src"),
            PathBuf::from("src/lib.rs"),
            PathBuf::from("src/nested"),
            PathBuf::from("src/nested/mod.rs"),
        ]
    );
    assert_eq!(
        snapshot.get(&root.join("src/lib.rs")).and_then(|e| e.metadata()).map(|m| m.len),
        Some(13)
    );
    assert_eq!(
        snapshot.get(&root.join("src")).map(|e| e.kind()),
        Some(FileKind::Directory)
    );
}

#[test]
fn stat_reports_missing_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let fs = RealFileSystem;

    assert_eq!(fs.stat(&dir.path().join("nope")).unwrap(), None);
    assert_eq!(fs.stat(dir.path()).unwrap(), Some(FileStat::Directory));
}
