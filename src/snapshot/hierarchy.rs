// src/snapshot/hierarchy.rs

//! Persistent snapshot tree.
//!
//! Nodes are keyed by path component and shared through `Arc`. An edit clones
//! only the nodes along the edited path, so every older `SnapshotHierarchy`
//! stays valid and unchanged.
//!
//! Invariant: apart from the root, every node either carries an entry or has
//! a descendant that does. Empty branches are pruned on removal, which keeps
//! structural equality equal to "same set of entries".

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::location::FileSystemLocationSnapshot;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Node {
    entry: Option<FileSystemLocationSnapshot>,
    children: BTreeMap<OsString, Arc<Node>>,
    /// Number of entries in this subtree, including `entry`.
    count: usize,
}

impl Node {
    fn recount(&mut self) {
        self.count = usize::from(self.entry.is_some())
            + self.children.values().map(|c| c.count).sum::<usize>();
    }

    fn find(&self, comps: &[OsString]) -> Option<&Node> {
        match comps.split_first() {
            None => Some(self),
            Some((head, rest)) => self.children.get(head)?.find(rest),
        }
    }

    fn insert(&self, comps: &[OsString], entry: FileSystemLocationSnapshot) -> Node {
        let mut node = self.clone();
        match comps.split_first() {
            None => {
                if !entry.may_have_children() {
                    node.children.clear();
                }
                node.entry = Some(entry);
            }
            Some((head, rest)) => {
                // A file or a missing location cannot have something below it.
                if node.entry.as_ref().is_some_and(|e| !e.may_have_children()) {
                    node.entry = None;
                }
                let child = match node.children.get(head) {
                    Some(existing) => existing.insert(rest, entry),
                    None => Node::default().insert(rest, entry),
                };
                node.children.insert(head.clone(), Arc::new(child));
            }
        }
        node.recount();
        node
    }

    /// `None` when nothing is stored at `comps`.
    fn remove(&self, comps: &[OsString]) -> Option<Node> {
        let (head, rest) = comps.split_first()?;
        let child = self.children.get(head)?;

        let mut node = self.clone();
        if rest.is_empty() {
            node.children.remove(head);
        } else {
            let new_child = child.remove(rest)?;
            if new_child.count == 0 {
                node.children.remove(head);
            } else {
                node.children.insert(head.clone(), Arc::new(new_child));
            }
        }
        node.recount();
        Some(node)
    }

    /// Copy of `self` where `comps` points at `subtree`.
    fn graft(&self, comps: &[OsString], subtree: Arc<Node>) -> Node {
        match comps.split_first() {
            None => (*subtree).clone(),
            Some((head, rest)) => {
                let mut node = self.clone();
                let child = match node.children.get(head) {
                    Some(existing) => existing.graft(rest, subtree),
                    None => Node::default().graft(rest, subtree),
                };
                if child.count == 0 {
                    node.children.remove(head);
                } else {
                    node.children.insert(head.clone(), Arc::new(child));
                }
                node.recount();
                node
            }
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a FileSystemLocationSnapshot>) {
        if let Some(entry) = &self.entry {
            out.push(entry);
        }
        for child in self.children.values() {
            child.collect(out);
        }
    }
}

fn components(path: &Path) -> Vec<OsString> {
    path.components()
        .map(|c| c.as_os_str().to_os_string())
        .collect()
}

/// Immutable tree of [`FileSystemLocationSnapshot`]s indexed by path.
///
/// Cloning is O(1). All "mutating" methods return a new hierarchy.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SnapshotHierarchy {
    root: Arc<Node>,
}

impl SnapshotHierarchy {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a hierarchy holding `entries`, later entries winning.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = FileSystemLocationSnapshot>,
    {
        entries
            .into_iter()
            .fold(Self::empty(), |acc, entry| acc.with_entry(entry))
    }

    pub fn len(&self) -> usize {
        self.root.count
    }

    pub fn is_empty(&self) -> bool {
        self.root.count == 0
    }

    /// Store `entry`, replacing whatever was known about its path.
    ///
    /// Entries for files and missing locations drop anything recorded below
    /// them; storing below a file or missing location clears that stale entry.
    pub fn with_entry(&self, entry: FileSystemLocationSnapshot) -> Self {
        let comps = components(entry.path());
        Self {
            root: Arc::new(self.root.insert(&comps, entry)),
        }
    }

    /// Remove `path` and everything recorded below it.
    pub fn without_subtree(&self, path: &Path) -> Self {
        let comps = components(path);
        if comps.is_empty() {
            return Self::empty();
        }
        match self.root.remove(&comps) {
            Some(root) => Self {
                root: Arc::new(root),
            },
            None => self.clone(),
        }
    }

    pub fn get(&self, path: &Path) -> Option<&FileSystemLocationSnapshot> {
        self.root.find(&components(path))?.entry.as_ref()
    }

    /// Whether anything is recorded at or below `path`.
    pub fn contains_under(&self, path: &Path) -> bool {
        self.root
            .find(&components(path))
            .is_some_and(|n| n.count > 0)
    }

    /// Hierarchy holding only what is recorded at or below `path`.
    pub fn subtree(&self, path: &Path) -> Self {
        self.retain_subtrees(std::iter::once(path))
    }

    /// Hierarchy holding only what is recorded at or below any of `roots`.
    pub fn retain_subtrees<'a, I>(&self, roots: I) -> Self
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut result = Node::default();
        for root in roots {
            let comps = components(root);
            // Grafting the found `Arc` shares the whole subtree with `self`.
            if let Some(shared) = self.find_arc(&comps) {
                if shared.count > 0 {
                    result = result.graft(&comps, shared);
                }
            }
        }
        Self {
            root: Arc::new(result),
        }
    }

    fn find_arc(&self, comps: &[OsString]) -> Option<Arc<Node>> {
        let mut current = Arc::clone(&self.root);
        for comp in comps {
            let next = Arc::clone(current.children.get(comp)?);
            current = next;
        }
        Some(current)
    }

    /// All entries, ordered by path component.
    pub fn entries(&self) -> Vec<&FileSystemLocationSnapshot> {
        let mut out = Vec::with_capacity(self.len());
        self.root.collect(&mut out);
        out
    }

    /// Paths of all entries, ordered by path component.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries()
            .into_iter()
            .map(|e| e.path().to_path_buf())
            .collect()
    }
}

impl fmt::Debug for SnapshotHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FileMetadata;
    use crate::types::FileKind;

    fn file(path: &str) -> FileSystemLocationSnapshot {
        FileSystemLocationSnapshot::regular_file(
            path,
            FileMetadata {
                len: 1,
                modified: None,
            },
        )
    }

    fn sample() -> SnapshotHierarchy {
        SnapshotHierarchy::from_entries([
            FileSystemLocationSnapshot::directory("/proj"),
            file("/proj/a.txt"),
            FileSystemLocationSnapshot::directory("/proj/b"),
            file("/proj/b/c.txt"),
            file("/other/x"),
        ])
    }

    #[test]
    fn edits_leave_previous_generation_untouched() {
        let before = sample();
        let after = before.without_subtree(Path::new("/proj/b"));

        assert_eq!(before.len(), 5);
        assert_eq!(after.len(), 3);
        assert!(before.get(Path::new("/proj/b/c.txt")).is_some());
        assert!(after.get(Path::new("/proj/b/c.txt")).is_none());
    }

    #[test]
    fn removing_unknown_path_is_a_no_op() {
        let s = sample();
        assert_eq!(s.without_subtree(Path::new("/nope/deeper")), s);
        assert_eq!(s.without_subtree(Path::new("/proj/a.txt/child")), s);
    }

    #[test]
    fn removal_prunes_empty_branches() {
        let s = SnapshotHierarchy::empty().with_entry(file("/a/b/c/d"));
        let removed = s.without_subtree(Path::new("/a/b/c/d"));
        assert_eq!(removed, SnapshotHierarchy::empty());
        assert!(!removed.contains_under(Path::new("/a")));
    }

    #[test]
    fn file_entry_drops_children_and_child_clears_file_entry() {
        let s = sample().with_entry(file("/proj/b"));
        assert_eq!(s.get(Path::new("/proj/b")).map(|e| e.kind()), Some(FileKind::RegularFile));
        assert!(s.get(Path::new("/proj/b/c.txt")).is_none());

        let s = s.with_entry(file("/proj/b/new.txt"));
        assert!(s.get(Path::new("/proj/b")).is_none());
        assert!(s.get(Path::new("/proj/b/new.txt")).is_some());
    }

    #[test]
    fn retain_subtrees_keeps_only_selected_roots() {
        let s = sample();
        let kept = s.retain_subtrees([Path::new("/proj/b"), Path::new("/other")]);
        assert_eq!(
            kept.paths(),
            vec![
                PathBuf::from("/other/x"),
                PathBuf::from("/proj/b"),
                PathBuf::from("/proj/b/c.txt"),
            ]
        );
    }

    #[test]
    fn subtree_of_unknown_path_is_empty() {
        assert!(sample().subtree(Path::new("/elsewhere")).is_empty());
    }
}
