// src/registry/core.rs

//! Registry state machine without locking.
//!
//! [`RegistryCore`] is the single mutable aggregate of a registry: the
//! watched hierarchies, the statistics window, the current snapshot
//! generation and the open/closed state. It performs no synchronization of
//! its own; [`FileWatcherRegistry`](super::FileWatcherRegistry) wraps it in a
//! mutex.
//!
//! The core is the only writer of the current generation. Callers hand in
//! changes (removed/added locations), never whole snapshots, so a generation
//! read earlier can't overwrite changes folded in since.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{ReceiveError, Result, VfsWatchError};
use crate::registry::handler::ChangeHandler;
use crate::registry::reconciler::{apply_change, apply_external_change, apply_lost_state};
use crate::registry::statistics::{FileWatchingStatistics, StatisticsCollector};
use crate::snapshot::{FileSystemLocationSnapshot, SnapshotHierarchy};
use crate::types::FileKind;
use crate::watch::backend::{NativeEvent, WatcherBackend};
use crate::watch::classifier::{classify, Classified};
use crate::watch::hierarchies::{HierarchySet, StopFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Open,
    /// Terminal. Holds the teardown failures reported by the first `close`.
    Closed { failures: Vec<String> },
}

pub struct RegistryCore<B: WatcherBackend, H: ChangeHandler> {
    hierarchies: HierarchySet<B>,
    handler: H,
    statistics: StatisticsCollector,
    root: SnapshotHierarchy,
    state: State,
}

impl<B: WatcherBackend, H: ChangeHandler> std::fmt::Debug for RegistryCore<B, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCore")
            .field("hierarchies", &self.hierarchies)
            .field("statistics", &self.statistics)
            .field("entries", &self.root.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<B: WatcherBackend, H: ChangeHandler> RegistryCore<B, H> {
    pub fn new(backend: B, handler: H, keep: Vec<PathBuf>) -> Self {
        Self {
            hierarchies: HierarchySet::new(backend, keep),
            handler,
            statistics: StatisticsCollector::new(),
            root: SnapshotHierarchy::empty(),
            state: State::Open,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Closed { .. } => Err(VfsWatchError::RegistryClosed),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed { .. })
    }

    /// Current snapshot generation, including changes folded in from native
    /// events. Later generations never affect the returned value.
    pub fn snapshot(&self) -> SnapshotHierarchy {
        self.root.clone()
    }

    /// Watched roots, most recently registered first.
    pub fn watched_hierarchies(&self) -> Vec<PathBuf> {
        self.hierarchies
            .roots()
            .into_iter()
            .map(Path::to_path_buf)
            .collect()
    }

    /// Start watching `path`. The current generation is left untouched; merge
    /// a scan of `path` through
    /// [`virtual_file_system_contents_changed`](Self::virtual_file_system_contents_changed).
    pub fn register_watchable_hierarchy(&mut self, path: &Path) -> Result<()> {
        self.ensure_open()?;
        let added = self.hierarchies.add(path);
        self.record_stop_failures();
        added?;
        Ok(())
    }

    /// Stop watching exactly the root `path`. Returns `false` if it was not a
    /// watched root. Whatever the snapshot knows under it is left alone until
    /// the next `build_finished`.
    pub fn unregister_watchable_hierarchy(&mut self, path: &Path) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.hierarchies.remove(path)?)
    }

    /// Mark `path` as kept across work cycles without watching it.
    pub fn register_keep_location(&mut self, path: &Path) -> Result<()> {
        self.ensure_open()?;
        self.hierarchies.mark_keep(path);
        debug!(?path, "registered keep location");
        Ok(())
    }

    /// Process one event from the native backend.
    ///
    /// Returns `false` once the registry is closed; the event is discarded.
    pub fn handle_native_event(&mut self, event: NativeEvent) -> bool {
        if self.is_closed() {
            debug!(?event, "registry closed; discarding native event");
            return false;
        }

        match classify(event, &self.hierarchies, &mut self.statistics) {
            Some(Classified::Change(change)) => {
                self.root = apply_change(&change, &self.root, &mut self.handler);
            }
            Some(Classified::LostState { root }) => {
                self.root = apply_lost_state(&root, &self.root, &mut self.handler);
            }
            None => {}
        }
        true
    }

    /// Merge caller-driven changes into the current generation and return the
    /// result.
    ///
    /// A watched root that is removed and re-added as a directory in the same
    /// batch gets a fresh native watch: the old one died with the directory.
    pub fn virtual_file_system_contents_changed(
        &mut self,
        removed: &[FileSystemLocationSnapshot],
        added: &[FileSystemLocationSnapshot],
    ) -> Result<SnapshotHierarchy> {
        self.ensure_open()?;

        let recreated_roots: Vec<PathBuf> = added
            .iter()
            .filter(|loc| loc.kind() == FileKind::Directory)
            .map(|loc| loc.path())
            .filter(|path| self.hierarchies.is_root(path))
            .filter(|path| removed.iter().any(|r| path.starts_with(r.path())))
            .map(Path::to_path_buf)
            .collect();
        for root in recreated_roots {
            self.hierarchies.rewatch(&root)?;
        }

        let next = apply_external_change(removed, added, &self.root);
        self.root = next.clone();
        Ok(next)
    }

    /// Prune the current generation and the watch set to what may be kept
    /// until the next work cycle. Watches that fail to stop are reported
    /// through the statistics error slot.
    pub fn build_finished(&mut self, max_hierarchies: usize) -> Result<SnapshotHierarchy> {
        self.ensure_open()?;

        let pruned = self.hierarchies.prune(&self.root, max_hierarchies);
        self.record_stop_failures();
        info!(
            watched = self.hierarchies.len(),
            evicted = pruned.stopped.len(),
            entries = pruned.snapshot.len(),
            "build finished"
        );

        self.root = pruned.snapshot.clone();
        Ok(pruned.snapshot)
    }

    fn record_stop_failures(&mut self) {
        for StopFailure { root, message } in self.hierarchies.take_stop_failures() {
            self.statistics
                .record_error(ReceiveError::StopFailed { root, message });
        }
    }

    pub fn get_and_reset_statistics(&mut self) -> Result<FileWatchingStatistics> {
        self.ensure_open()?;
        Ok(self.statistics.get_and_reset(self.hierarchies.len()))
    }

    /// Stop all native watches. Repeated calls return the first call's result.
    pub fn close(&mut self) -> Result<()> {
        if let State::Closed { failures } = &self.state {
            return close_result(failures);
        }

        let failures: Vec<String> = self
            .hierarchies
            .close()
            .iter()
            .map(ToString::to_string)
            .collect();
        if failures.is_empty() {
            info!("file watcher registry closed");
        } else {
            warn!(failed = failures.len(), "file watcher registry closed with teardown failures");
        }
        let result = close_result(&failures);
        self.state = State::Closed { failures };
        result
    }
}

fn close_result(failures: &[String]) -> Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(VfsWatchError::CloseFailed {
            failures: failures.to_vec(),
        })
    }
}
