// src/watch/hierarchies.rs

//! The set of hierarchies under active native watch.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::WatchSetupError;
use crate::snapshot::SnapshotHierarchy;
use crate::watch::backend::WatcherBackend;

/// A directory root under active native watch.
struct WatchedHierarchy<H> {
    path: PathBuf,
    handle: H,
    /// Registration sequence number; higher is more recent.
    seq: u64,
}

impl<H> fmt::Debug for WatchedHierarchy<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchedHierarchy")
            .field("path", &self.path)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

/// Result of [`HierarchySet::prune`].
#[derive(Debug, Clone)]
pub struct Pruned {
    /// Snapshot restricted to kept hierarchies and keep locations.
    pub snapshot: SnapshotHierarchy,
    /// Roots whose native watch was stopped.
    pub stopped: Vec<PathBuf>,
}

/// A native watch whose `stop` failed. The handle is gone either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopFailure {
    pub root: PathBuf,
    pub message: String,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.root, self.message)
    }
}

/// Owns every native watch handle and the keep-across-cycles locations.
///
/// Invariants:
/// - at most one watch per path;
/// - no watched root lies inside another watched root;
/// - every handle is passed to [`WatcherBackend::stop`] exactly once, on
///   removal, pruning, [`close`](Self::close) or drop.
///
/// `stop` failures from replacing nested watches and from pruning are queued
/// until the owner drains them with [`take_stop_failures`](Self::take_stop_failures).
pub struct HierarchySet<B: WatcherBackend> {
    backend: B,
    watched: Vec<WatchedHierarchy<B::Handle>>,
    keep: Vec<PathBuf>,
    next_seq: u64,
    stop_failures: Vec<StopFailure>,
}

impl<B: WatcherBackend> fmt::Debug for HierarchySet<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchySet")
            .field("watched", &self.watched)
            .field("keep", &self.keep)
            .finish_non_exhaustive()
    }
}

impl<B: WatcherBackend> HierarchySet<B> {
    pub fn new(backend: B, keep: Vec<PathBuf>) -> Self {
        Self {
            backend,
            watched: Vec::new(),
            keep,
            next_seq: 0,
            stop_failures: Vec::new(),
        }
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Watch `path`.
    ///
    /// - Already covered by an equal or ancestor root: no new watch, but the
    ///   covering root counts as freshly registered.
    /// - Ancestor of existing roots: the new watch replaces them.
    pub fn add(&mut self, path: &Path) -> Result<(), WatchSetupError> {
        let seq = self.bump_seq();

        if let Some(existing) = self.watched.iter_mut().find(|w| path.starts_with(&w.path)) {
            debug!(
                path = ?path,
                covered_by = ?existing.path,
                "hierarchy already covered by a native watch"
            );
            existing.seq = seq;
            return Ok(());
        }

        let handle = self.backend.start(path)?;

        let (nested, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.watched)
            .into_iter()
            .partition(|w| w.path.starts_with(path));
        self.watched = rest;
        for inner in nested {
            debug!(inner = ?inner.path, outer = ?path, "replacing nested watch");
            self.stop_recording(inner);
        }

        info!(path = ?path, "watching hierarchy");
        self.watched.push(WatchedHierarchy {
            path: path.to_path_buf(),
            handle,
            seq,
        });
        Ok(())
    }

    /// Stop watching exactly `path`. Returns `Ok(false)` if it was not watched.
    pub fn remove(&mut self, path: &Path) -> std::io::Result<bool> {
        let Some(idx) = self.watched.iter().position(|w| w.path == path) else {
            return Ok(false);
        };
        let removed = self.watched.remove(idx);
        info!(path = ?path, "stopped watching hierarchy");
        self.backend.stop(removed.handle)?;
        Ok(true)
    }

    /// Replace the native watch for `path` with a fresh one, keeping its
    /// registration order. Used when the watched directory itself was
    /// deleted and recreated, which kills the old OS watch.
    pub fn rewatch(&mut self, path: &Path) -> Result<(), WatchSetupError> {
        let Some(idx) = self.watched.iter().position(|w| w.path == path) else {
            return Ok(());
        };
        let old = self.watched.remove(idx);
        if let Err(err) = self.backend.stop(old.handle) {
            debug!(root = ?path, error = %err, "old watch was already gone");
        }
        let handle = self.backend.start(path)?;
        self.watched.push(WatchedHierarchy {
            path: path.to_path_buf(),
            handle,
            seq: old.seq,
        });
        debug!(root = ?path, "re-established native watch");
        Ok(())
    }

    /// The watched root containing `path`, if any.
    pub fn covering_root(&self, path: &Path) -> Option<&Path> {
        self.watched
            .iter()
            .find(|w| path.starts_with(&w.path))
            .map(|w| w.path.as_path())
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.covering_root(path).is_some()
    }

    /// Whether `path` is exactly a watched root.
    pub fn is_root(&self, path: &Path) -> bool {
        self.watched.iter().any(|w| w.path == path)
    }

    /// Watched roots, most recently registered first.
    pub fn roots(&self) -> Vec<&Path> {
        let mut sorted: Vec<&WatchedHierarchy<B::Handle>> = self.watched.iter().collect();
        sorted.sort_by(|a, b| b.seq.cmp(&a.seq));
        sorted.into_iter().map(|w| w.path.as_path()).collect()
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// Mark `path` as kept across work cycles (no native watch is started).
    pub fn mark_keep(&mut self, path: &Path) {
        if !self.keep.iter().any(|k| k == path) {
            self.keep.push(path.to_path_buf());
        }
    }

    /// Restrict the snapshot and the watch set to what may survive into the
    /// next work cycle.
    ///
    /// At most `max_hierarchies` roots keep their native watch, most recently
    /// registered first. Snapshot content survives if it lies inside a kept
    /// root or a keep location; everything else is dropped.
    pub fn prune(&mut self, snapshot: &SnapshotHierarchy, max_hierarchies: usize) -> Pruned {
        self.watched.sort_by(|a, b| b.seq.cmp(&a.seq));
        let evicted: Vec<WatchedHierarchy<B::Handle>> = if self.watched.len() > max_hierarchies {
            self.watched.split_off(max_hierarchies)
        } else {
            Vec::new()
        };

        let mut stopped = Vec::with_capacity(evicted.len());
        for old in evicted {
            info!(path = ?old.path, "hierarchy evicted at end of cycle");
            stopped.push(old.path.clone());
            self.stop_recording(old);
        }

        let retained_roots = self
            .watched
            .iter()
            .map(|w| w.path.as_path())
            .chain(self.keep.iter().map(PathBuf::as_path));
        let snapshot = snapshot.retain_subtrees(retained_roots);

        debug!(
            watched = self.watched.len(),
            evicted = stopped.len(),
            entries = snapshot.len(),
            "pruned hierarchies"
        );

        Pruned { snapshot, stopped }
    }

    fn stop_recording(&mut self, old: WatchedHierarchy<B::Handle>) {
        if let Err(err) = self.backend.stop(old.handle) {
            warn!(root = ?old.path, error = %err, "failed to stop native watch");
            self.stop_failures.push(StopFailure {
                root: old.path,
                message: err.to_string(),
            });
        }
    }

    /// `stop` failures queued since the previous call.
    pub fn take_stop_failures(&mut self) -> Vec<StopFailure> {
        std::mem::take(&mut self.stop_failures)
    }

    /// Stop every watch. Returns every failure not yet drained, including
    /// the ones from this call.
    pub fn close(&mut self) -> Vec<StopFailure> {
        for w in std::mem::take(&mut self.watched) {
            self.stop_recording(w);
        }
        self.take_stop_failures()
    }

    /// Access the backend (used by tests to inspect fakes).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: WatcherBackend> Drop for HierarchySet<B> {
    fn drop(&mut self) {
        let failures = self.close();
        if !failures.is_empty() {
            debug!(?failures, "failed to stop watches while dropping hierarchy set");
        }
    }
}
