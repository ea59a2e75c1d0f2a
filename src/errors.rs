// src/errors.rs

//! Crate-wide error types and aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VfsWatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The native backend could not add or keep a watch. Callers should stop
    /// relying on watch-based invalidation for the rest of the run.
    #[error("File watching is not supported: {0}")]
    WatchingNotSupported(#[from] WatchSetupError),

    #[error("File watcher registry is closed")]
    RegistryClosed,

    #[error("Failed to stop {} native watch(es): {}", .failures.len(), .failures.join("; "))]
    CloseFailed { failures: Vec<String> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why the native backend refused to start watching a hierarchy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchSetupError {
    #[error("cannot watch {0:?}: path does not exist")]
    PathMissing(PathBuf),

    #[error("cannot watch {0:?}: permission denied")]
    PermissionDenied(PathBuf),

    #[error("cannot watch {path:?}: watch limit reached ({message})")]
    ResourceExhausted { path: PathBuf, message: String },

    #[error("cannot watch {path:?}: {message}")]
    Backend { path: PathBuf, message: String },
}

impl WatchSetupError {
    pub fn path(&self) -> &PathBuf {
        match self {
            WatchSetupError::PathMissing(path) | WatchSetupError::PermissionDenied(path) => path,
            WatchSetupError::ResourceExhausted { path, .. } | WatchSetupError::Backend { path, .. } => {
                path
            }
        }
    }
}

/// First watcher problem observed during a work cycle, as reported in
/// [`FileWatchingStatistics`](crate::registry::FileWatchingStatistics).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    #[error("native watcher lost events under {root:?}")]
    LostState { root: PathBuf },

    #[error("native watcher error under {root:?}: {message}")]
    Backend { root: PathBuf, message: String },

    /// An evicted or replaced watch could not be released cleanly.
    #[error("failed to stop native watch on {root:?}: {message}")]
    StopFailed { root: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, VfsWatchError>;
