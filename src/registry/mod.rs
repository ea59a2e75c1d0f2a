// src/registry/mod.rs

//! The file watcher registry.
//!
//! - [`core`] holds the lock-free state machine ([`RegistryCore`]).
//! - [`reconciler`] folds changes into snapshots.
//! - [`statistics`] accumulates per-cycle counters.
//! - [`handler`] defines the caller's callback surface.
//! - [`event_loop`] drains a backend's event channel into the registry.
//!
//! [`FileWatcherRegistry`] is the public, thread-safe entry point: every
//! operation and every native event is processed under one mutex.

pub mod core;
pub mod event_loop;
pub mod handler;
pub mod reconciler;
pub mod statistics;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::Result;
use crate::snapshot::{FileSystemLocationSnapshot, SnapshotHierarchy};
use crate::watch::backend::{NativeEvent, WatcherBackend};

pub use self::core::RegistryCore;
pub use event_loop::spawn_event_loop;
pub use handler::{ChangeHandler, ReportingHandler};
pub use statistics::{FileWatchingStatistics, StatisticsCollector};

/// Thread-safe registry of watched hierarchies.
///
/// Cloning is cheap and yields another handle to the same registry, which is
/// how the event loop and the caller share it.
pub struct FileWatcherRegistry<B: WatcherBackend, H: ChangeHandler> {
    inner: Arc<Mutex<RegistryCore<B, H>>>,
}

impl<B: WatcherBackend, H: ChangeHandler> Clone for FileWatcherRegistry<B, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: WatcherBackend, H: ChangeHandler> fmt::Debug for FileWatcherRegistry<B, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileWatcherRegistry")
            .field("core", &*self.lock())
            .finish()
    }
}

impl<B: WatcherBackend, H: ChangeHandler> FileWatcherRegistry<B, H> {
    /// Create an open registry. `keep` lists locations whose snapshot state
    /// survives [`build_finished`](Self::build_finished) without a watch.
    pub fn new(backend: B, handler: H, keep: Vec<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryCore::new(backend, handler, keep))),
        }
    }

    // A handler that panicked poisons the mutex; the core itself is still
    // consistent because every generation swap is a single assignment.
    fn lock(&self) -> MutexGuard<'_, RegistryCore<B, H>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin watching `path`.
    ///
    /// Fails with [`VfsWatchError::WatchingNotSupported`] if the backend
    /// rejects the watch; callers should then stop relying on watching for
    /// the rest of the run. Do not hold other locks across this call: setting
    /// up a native watch may block briefly.
    ///
    /// [`VfsWatchError::WatchingNotSupported`]: crate::errors::VfsWatchError::WatchingNotSupported
    pub fn register_watchable_hierarchy(&self, path: &Path) -> Result<()> {
        self.lock().register_watchable_hierarchy(path)
    }

    pub fn unregister_watchable_hierarchy(&self, path: &Path) -> Result<bool> {
        self.lock().unregister_watchable_hierarchy(path)
    }

    /// Keep whatever is known under `path` across work cycles, unwatched.
    pub fn register_keep_location(&self, path: &Path) -> Result<()> {
        self.lock().register_keep_location(path)
    }

    /// Merge changes the caller made or observed itself (including fresh
    /// scans) and return the new current generation.
    pub fn virtual_file_system_contents_changed(
        &self,
        removed: &[FileSystemLocationSnapshot],
        added: &[FileSystemLocationSnapshot],
    ) -> Result<SnapshotHierarchy> {
        self.lock()
            .virtual_file_system_contents_changed(removed, added)
    }

    /// Drop everything that can't be kept until the next work cycle and
    /// return what remains.
    pub fn build_finished(&self, max_hierarchies: usize) -> Result<SnapshotHierarchy> {
        self.lock().build_finished(max_hierarchies)
    }

    pub fn get_and_reset_statistics(&self) -> Result<FileWatchingStatistics> {
        self.lock().get_and_reset_statistics()
    }

    /// Stop watching without handling pending changes. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.lock().close()
    }

    /// Feed one backend event through classification and reconciliation.
    ///
    /// Returns `false` if the registry is closed (the event is discarded).
    pub fn handle_native_event(&self, event: NativeEvent) -> bool {
        self.lock().handle_native_event(event)
    }

    pub fn snapshot(&self) -> SnapshotHierarchy {
        self.lock().snapshot()
    }

    pub fn watched_hierarchies(&self) -> Vec<PathBuf> {
        self.lock().watched_hierarchies()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_closed()
    }
}
