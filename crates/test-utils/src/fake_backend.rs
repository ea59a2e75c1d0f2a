use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use vfswatch::errors::WatchSetupError;
use vfswatch::watch::WatcherBackend;

#[derive(Debug, Default)]
struct State {
    active: BTreeSet<PathBuf>,
    started: Vec<PathBuf>,
    stopped: Vec<PathBuf>,
    reject: HashSet<PathBuf>,
    fail_stop: HashSet<PathBuf>,
}

/// A fake watcher backend that:
/// - records every `start` / `stop` call,
/// - refuses to watch paths registered with [`FakeBackend::reject`],
/// - fails `stop` for paths registered with [`FakeBackend::fail_stop`].
///
/// Clones share state, so a test keeps one clone for inspection and hands the
/// other to the registry.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

/// Handle given out by [`FakeBackend`]: the watched path.
#[derive(Debug)]
pub struct FakeHandle(PathBuf);

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().reject.insert(path.into());
    }

    pub fn fail_stop(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().fail_stop.insert(path.into());
    }

    /// Paths with a native watch currently open, sorted.
    pub fn active(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().active.iter().cloned().collect()
    }

    /// Every path passed to `start`, in call order.
    pub fn started(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().started.clone()
    }

    /// Every path passed to `stop`, in call order.
    pub fn stopped(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().stopped.clone()
    }
}

impl WatcherBackend for FakeBackend {
    type Handle = FakeHandle;

    fn start(&mut self, root: &Path) -> Result<FakeHandle, WatchSetupError> {
        let mut state = self.state.lock().unwrap();
        if state.reject.contains(root) {
            return Err(WatchSetupError::Backend {
                path: root.to_path_buf(),
                message: "rejected by fake backend".to_string(),
            });
        }
        state.started.push(root.to_path_buf());
        state.active.insert(root.to_path_buf());
        Ok(FakeHandle(root.to_path_buf()))
    }

    fn stop(&mut self, handle: FakeHandle) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.active.remove(&handle.0);
        state.stopped.push(handle.0.clone());
        if state.fail_stop.contains(&handle.0) {
            return Err(io::Error::other(format!("fake stop failure for {:?}", handle.0)));
        }
        Ok(())
    }
}
