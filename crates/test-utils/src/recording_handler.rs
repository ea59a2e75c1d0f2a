use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use vfswatch::registry::ChangeHandler;
use vfswatch::types::ChangeType;

#[derive(Debug, Default)]
struct Recorded {
    changes: Vec<(ChangeType, PathBuf)>,
    lost_state: usize,
}

/// A change handler that records every callback, in order.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> Vec<(ChangeType, PathBuf)> {
        self.inner.lock().unwrap().changes.clone()
    }

    pub fn lost_state_calls(&self) -> usize {
        self.inner.lock().unwrap().lost_state
    }
}

impl ChangeHandler for RecordingHandler {
    fn handle_change(&mut self, kind: ChangeType, path: &Path) {
        self.inner
            .lock()
            .unwrap()
            .changes
            .push((kind, path.to_path_buf()));
    }

    fn handle_lost_state(&mut self) {
        self.inner.lock().unwrap().lost_state += 1;
    }
}
