// src/watch/mod.rs

//! Native watching and event classification.
//!
//! This module is responsible for:
//! - The [`WatcherBackend`] seam in front of the OS event source, and its
//!   production implementation on top of `notify`.
//! - Tracking which hierarchies are under native watch ([`HierarchySet`]),
//!   including the bounded pruning applied between work cycles.
//! - Turning raw [`NativeEvent`]s into [`ChangeEvent`]s or lost-state signals
//!   ([`classifier`]).
//!
//! It does **not** touch the snapshot except when pruning; folding changes into
//! the snapshot is the registry's job.
//!
//! [`ChangeEvent`]: crate::types::ChangeEvent

pub mod backend;
pub mod classifier;
pub mod hierarchies;
pub mod notify_backend;

pub use backend::{NativeChangeKind, NativeEvent, WatcherBackend};
pub use classifier::{classify, Classified};
pub use hierarchies::{HierarchySet, Pruned, StopFailure};
pub use notify_backend::{NotifyBackend, NotifyHandle};
