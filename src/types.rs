// src/types.rs

use std::fmt;
use std::path::PathBuf;

/// Kind of change reported to a [`ChangeHandler`](crate::registry::ChangeHandler).
///
/// - `Created` / `Modified`: the path exists but its recorded state is stale.
/// - `Removed`: the path (and anything below it) is gone.
/// - `Invalidated`: the precise kind could not be determined (rename chains,
///   unknown native kinds), but the prior state can no longer be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Created,
    Modified,
    Removed,
    Invalidated,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeType::Created => "CREATED",
            ChangeType::Modified => "MODIFIED",
            ChangeType::Removed => "REMOVED",
            ChangeType::Invalidated => "INVALIDATED",
        };
        f.pad(s)
    }
}

/// A classified change, alive only for the duration of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeType,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeType, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// What a snapshot entry knows about a location on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Directory,
    RegularFile,
    /// Known not to exist.
    Missing,
    /// Known to exist after a change event, not yet re-read from disk.
    Unverified,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_respects_padding() {
        assert_eq!(format!("{:<11}|", ChangeType::Removed), "REMOVED    |");
        assert_eq!(ChangeType::Invalidated.to_string(), "INVALIDATED");
    }
}
