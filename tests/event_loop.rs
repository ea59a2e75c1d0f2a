// tests/event_loop.rs

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::Harness;
use tokio::sync::mpsc;
use vfswatch::fs::RealFileSystem;
use vfswatch::registry::{spawn_event_loop, FileWatcherRegistry};
use vfswatch::snapshot::snapshot_directory;
use vfswatch::types::ChangeType;
use vfswatch::watch::{NativeChangeKind, NativeEvent, NotifyBackend};
use vfswatch_test_utils::recording_handler::RecordingHandler;
use vfswatch_test_utils::with_timeout;

#[tokio::test]
async fn event_loop_applies_events_in_arrival_order() {
    let h = Harness::new();
    h.watch("/proj");
    let (tx, rx) = mpsc::unbounded_channel();
    let task = spawn_event_loop(h.registry.clone(), rx);

    tx.send(NativeEvent::change(NativeChangeKind::Created, "/proj/a")).unwrap();
    tx.send(NativeEvent::change(NativeChangeKind::Removed, "/proj/a")).unwrap();
    tx.send(NativeEvent::change(NativeChangeKind::Created, "/proj/b")).unwrap();
    drop(tx);

    with_timeout(task).await.unwrap();

    assert_eq!(
        h.handler.changes(),
        vec![
            (ChangeType::Created, PathBuf::from("/proj/a")),
            (ChangeType::Removed, PathBuf::from("/proj/a")),
            (ChangeType::Created, PathBuf::from("/proj/b")),
        ]
    );
    assert_eq!(h.registry.snapshot().paths(), vec![PathBuf::from("/proj/b")]);
}

#[tokio::test]
async fn event_loop_stops_once_the_registry_is_closed() {
    let h = Harness::new();
    h.watch("/proj");
    let (tx, rx) = mpsc::unbounded_channel();
    let task = spawn_event_loop(h.registry.clone(), rx);

    h.registry.close().unwrap();
    tx.send(NativeEvent::change(NativeChangeKind::Created, "/proj/late")).unwrap();

    // The sender is still alive: only the closed registry can end the loop.
    with_timeout(task).await.unwrap();
    assert!(h.handler.changes().is_empty());
    drop(tx);
}

#[tokio::test]
async fn notify_backend_delivers_real_changes() {
    vfswatch_test_utils::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let handler = RecordingHandler::new();
    let registry = FileWatcherRegistry::new(NotifyBackend::new(tx), handler.clone(), Vec::new());
    let task = spawn_event_loop(registry.clone(), rx);

    let initial = snapshot_directory(&RealFileSystem, &root).unwrap();
    registry.register_watchable_hierarchy(&root).unwrap();
    registry
        .virtual_file_system_contents_changed(&[], &initial)
        .unwrap();

    let file = root.join("hello.txt");
    std::fs::write(&file, b"hi").unwrap();

    with_timeout(async {
        while !handler.changes().iter().any(|(_, p)| p == &file) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    let stats = registry.get_and_reset_statistics().unwrap();
    assert!(stats.number_of_received_events >= 1);
    assert_eq!(stats.number_of_watched_hierarchies, 1);

    registry.close().unwrap();
    task.abort();
}
