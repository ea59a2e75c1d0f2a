// src/registry/reconciler.rs

//! Folds classified changes into the snapshot.
//!
//! Every function here is pure with respect to its snapshot argument and
//! returns the next generation.

use std::path::Path;

use tracing::{debug, info};

use crate::registry::handler::ChangeHandler;
use crate::snapshot::{FileSystemLocationSnapshot, SnapshotHierarchy};
use crate::types::{ChangeEvent, ChangeType};

/// Apply one change, then notify `handler`.
///
/// - `Created`: anything previously known at or below the path is dropped and
///   a fresh unverified entry takes its place.
/// - `Modified`: the path's entry is replaced by a fresh unverified entry;
///   entries below it stay. Watches are recursive, so a child that changed
///   reports its own event; a directory's `Modified` only covers the
///   directory's own metadata. Anything that cannot be attributed that way
///   (renames, unknown kinds, lost events) arrives as `Invalidated` or lost
///   state and evicts the subtree.
/// - `Removed` / `Invalidated`: the path and everything below it are evicted.
pub fn apply_change(
    change: &ChangeEvent,
    snapshot: &SnapshotHierarchy,
    handler: &mut dyn ChangeHandler,
) -> SnapshotHierarchy {
    let path = change.path.as_path();
    let next = match change.kind {
        ChangeType::Created => snapshot
            .without_subtree(path)
            .with_entry(FileSystemLocationSnapshot::unverified(path)),
        ChangeType::Modified => snapshot.with_entry(FileSystemLocationSnapshot::unverified(path)),
        ChangeType::Removed | ChangeType::Invalidated => snapshot.without_subtree(path),
    };
    debug!(kind = %change.kind, ?path, entries = next.len(), "reconciled change");
    handler.handle_change(change.kind, path);
    next
}

/// Evict everything under `root`, then tell `handler` that state was lost.
pub fn apply_lost_state(
    root: &Path,
    snapshot: &SnapshotHierarchy,
    handler: &mut dyn ChangeHandler,
) -> SnapshotHierarchy {
    let next = snapshot.without_subtree(root);
    info!(
        ?root,
        evicted = snapshot.len() - next.len(),
        "invalidated hierarchy after lost state"
    );
    handler.handle_lost_state();
    next
}

/// Merge changes the caller already knows about: evict each removed
/// location's subtree, then store each added location.
pub fn apply_external_change(
    removed: &[FileSystemLocationSnapshot],
    added: &[FileSystemLocationSnapshot],
    snapshot: &SnapshotHierarchy,
) -> SnapshotHierarchy {
    let without_removed = removed
        .iter()
        .fold(snapshot.clone(), |acc, loc| acc.without_subtree(loc.path()));
    let next = added
        .iter()
        .fold(without_removed, |acc, loc| acc.with_entry(loc.clone()));
    debug!(
        removed = removed.len(),
        added = added.len(),
        entries = next.len(),
        "merged external change"
    );
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FileMetadata;
    use crate::types::FileKind;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Log {
        changes: Vec<(ChangeType, PathBuf)>,
        lost: usize,
    }

    impl ChangeHandler for Log {
        fn handle_change(&mut self, kind: ChangeType, path: &Path) {
            self.changes.push((kind, path.to_path_buf()));
        }

        fn handle_lost_state(&mut self) {
            self.lost += 1;
        }
    }

    fn file(path: &str) -> FileSystemLocationSnapshot {
        FileSystemLocationSnapshot::regular_file(path, FileMetadata { len: 3, modified: None })
    }

    fn project() -> SnapshotHierarchy {
        SnapshotHierarchy::from_entries([
            FileSystemLocationSnapshot::directory("/proj"),
            file("/proj/a.txt"),
            FileSystemLocationSnapshot::directory("/proj/b"),
            file("/proj/b/c.txt"),
            FileSystemLocationSnapshot::directory("/proj/b/d"),
            file("/proj/b/d/e.txt"),
        ])
    }

    #[test]
    fn removal_evicts_whole_subtree_and_notifies() {
        let mut log = Log::default();
        let next = apply_change(
            &ChangeEvent::new(ChangeType::Removed, "/proj/b"),
            &project(),
            &mut log,
        );

        assert!(!next.contains_under(Path::new("/proj/b")));
        assert!(next.get(Path::new("/proj/a.txt")).is_some());
        assert_eq!(log.changes, vec![(ChangeType::Removed, PathBuf::from("/proj/b"))]);
    }

    #[test]
    fn modified_replaces_entry_but_keeps_children() {
        let mut log = Log::default();
        let next = apply_change(
            &ChangeEvent::new(ChangeType::Modified, "/proj/b"),
            &project(),
            &mut log,
        );

        assert_eq!(next.get(Path::new("/proj/b")).map(|e| e.kind()), Some(FileKind::Unverified));
        assert!(next.get(Path::new("/proj/b/c.txt")).is_some());
    }

    #[test]
    fn created_drops_stale_children() {
        let mut log = Log::default();
        let next = apply_change(
            &ChangeEvent::new(ChangeType::Created, "/proj/b"),
            &project(),
            &mut log,
        );

        assert_eq!(next.get(Path::new("/proj/b")).map(|e| e.kind()), Some(FileKind::Unverified));
        assert!(next.get(Path::new("/proj/b/c.txt")).is_none());
    }

    #[test]
    fn lost_state_evicts_everything_under_root_once() {
        let mut log = Log::default();
        let before = project().with_entry(file("/other/keep.txt"));
        let next = apply_lost_state(Path::new("/proj"), &before, &mut log);

        assert!(!next.contains_under(Path::new("/proj")));
        assert_eq!(next.paths(), vec![PathBuf::from("/other/keep.txt")]);
        assert_eq!(log.lost, 1);
        assert!(log.changes.is_empty());
    }

    #[test]
    fn external_change_removes_then_adds() {
        let next = apply_external_change(
            &[FileSystemLocationSnapshot::directory("/proj/b")],
            &[file("/proj/b"), file("/proj/new.txt")],
            &project(),
        );

        assert_eq!(
            next.get(Path::new("/proj/b")).map(|e| e.kind()),
            Some(FileKind::RegularFile)
        );
        assert!(next.get(Path::new("/proj/b/c.txt")).is_none());
        assert!(next.get(Path::new("/proj/new.txt")).is_some());
    }
}
