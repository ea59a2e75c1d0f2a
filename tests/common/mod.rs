#![allow(dead_code)]

use std::path::PathBuf;

use vfswatch::registry::FileWatcherRegistry;
use vfswatch::snapshot::FileSystemLocationSnapshot;
use vfswatch_test_utils::fake_backend::FakeBackend;
use vfswatch_test_utils::recording_handler::RecordingHandler;

pub use vfswatch_test_utils::init_tracing;

pub type TestRegistry = FileWatcherRegistry<FakeBackend, RecordingHandler>;

/// An open registry plus inspection handles for its backend and handler.
pub struct Harness {
    pub registry: TestRegistry,
    pub backend: FakeBackend,
    pub handler: RecordingHandler,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_keep(Vec::new())
    }

    pub fn with_keep(keep: Vec<PathBuf>) -> Self {
        init_tracing();
        let backend = FakeBackend::new();
        let handler = RecordingHandler::new();
        let registry = FileWatcherRegistry::new(backend.clone(), handler.clone(), keep);
        Self {
            registry,
            backend,
            handler,
        }
    }

    pub fn watch(&self, root: &str) {
        self.registry
            .register_watchable_hierarchy(&PathBuf::from(root))
            .unwrap();
    }

    /// Merge `entries` into the current generation, as a fresh scan would.
    pub fn seed(&self, entries: &[FileSystemLocationSnapshot]) {
        self.registry
            .virtual_file_system_contents_changed(&[], entries)
            .unwrap();
    }
}
