// src/snapshot/mod.rs

//! In-memory model of known filesystem state.
//!
//! - [`location`] holds the per-path entry type.
//! - [`hierarchy`] is the persistent, structurally shared tree of entries.
//! - [`scan`] builds entries for a directory through the [`FileSystem`]
//!   abstraction, used after registration and lost state.
//!
//! [`FileSystem`]: crate::fs::FileSystem

pub mod hierarchy;
pub mod location;
pub mod scan;

pub use hierarchy::SnapshotHierarchy;
pub use location::{FileMetadata, FileSystemLocationSnapshot};
pub use scan::snapshot_directory;
