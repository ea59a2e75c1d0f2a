// src/watch/backend.rs

//! Seam between the registry and the OS-specific event source.

use std::io;
use std::path::{Path, PathBuf};

use crate::errors::WatchSetupError;

/// Change kind as classified by the native backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeChangeKind {
    Created,
    Modified,
    Removed,
    /// One half of a rename; the backend cannot tell which half.
    Renamed,
    /// Something the backend reported that we do not have a mapping for.
    Unknown(String),
}

/// Raw event delivered by a backend, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    Change { kind: NativeChangeKind, path: PathBuf },
    /// The backend dropped events for `root` (e.g. queue overflow).
    Overflow { root: PathBuf },
    /// The backend hit an error while watching `root`; delivery for it can no
    /// longer be trusted.
    Error { root: PathBuf, message: String },
}

impl NativeEvent {
    pub fn change(kind: NativeChangeKind, path: impl Into<PathBuf>) -> Self {
        NativeEvent::Change {
            kind,
            path: path.into(),
        }
    }
}

/// Trait abstracting how native watches are acquired and released.
///
/// Production code uses [`NotifyBackend`](super::NotifyBackend); tests can
/// provide an implementation that only records calls. Events are not part of
/// this trait: each backend delivers them through whatever channel it was
/// constructed with.
pub trait WatcherBackend: Send {
    /// Opaque resource representing one active recursive watch.
    type Handle: Send;

    /// Start watching `root` recursively.
    fn start(&mut self, root: &Path) -> Result<Self::Handle, WatchSetupError>;

    /// Release a watch. Consumes the handle so it cannot be released twice.
    fn stop(&mut self, handle: Self::Handle) -> io::Result<()>;
}
