// src/watch/notify_backend.rs

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::WatchSetupError;
use crate::watch::backend::{NativeChangeKind, NativeEvent, WatcherBackend};

/// EMFILE: per-process limit on inotify instances / open descriptors.
const EMFILE: i32 = 24;

/// Handle for one recursive `notify` watch.
///
/// Each watched hierarchy gets its own `RecommendedWatcher`, so the watcher
/// itself is the handle. Dropping it also stops the OS watch.
pub struct NotifyHandle {
    root: PathBuf,
    watcher: RecommendedWatcher,
}

impl NotifyHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl fmt::Debug for NotifyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Production backend on top of the cross-platform `notify` crate.
///
/// Events from every watcher are forwarded, already mapped to
/// [`NativeEvent`]s, into the channel given to [`NotifyBackend::new`].
#[derive(Debug, Clone)]
pub struct NotifyBackend {
    event_tx: mpsc::UnboundedSender<NativeEvent>,
}

impl NotifyBackend {
    pub fn new(event_tx: mpsc::UnboundedSender<NativeEvent>) -> Self {
        Self { event_tx }
    }
}

impl WatcherBackend for NotifyBackend {
    type Handle = NotifyHandle;

    fn start(&mut self, root: &Path) -> Result<NotifyHandle, WatchSetupError> {
        let event_tx = self.event_tx.clone();
        let cb_root = root.to_path_buf();

        // Called synchronously by notify on its own thread.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let events = match res {
                    Ok(event) => native_events(&cb_root, event),
                    Err(err) => vec![NativeEvent::Error {
                        root: cb_root.clone(),
                        message: err.to_string(),
                    }],
                };
                for event in events {
                    if event_tx.send(event).is_err() {
                        // Receiver is gone: the registry is closed.
                        return;
                    }
                }
            },
            Config::default(),
        )
        .map_err(|e| setup_error(root, e))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| setup_error(root, e))?;

        info!("native watch started on {:?}", root);

        Ok(NotifyHandle {
            root: root.to_path_buf(),
            watcher,
        })
    }

    fn stop(&mut self, mut handle: NotifyHandle) -> io::Result<()> {
        let result = handle
            .watcher
            .unwatch(&handle.root)
            .map_err(|e| io::Error::other(format!("unwatching {:?}: {e}", handle.root)));
        debug!(root = ?handle.root, ok = result.is_ok(), "native watch stopped");
        result
    }
}

/// Map one `notify` event into zero or more [`NativeEvent`]s (one per path).
///
/// `root` is the hierarchy the emitting watcher was started for; rescan
/// requests usually come without paths, so it is the only thing we can blame.
pub fn native_events(root: &Path, event: Event) -> Vec<NativeEvent> {
    if event.need_rescan() {
        return vec![NativeEvent::Overflow {
            root: root.to_path_buf(),
        }];
    }

    let kind = match event.kind {
        EventKind::Create(_) => NativeChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(_)) => NativeChangeKind::Renamed,
        EventKind::Modify(_) => NativeChangeKind::Modified,
        EventKind::Remove(_) => NativeChangeKind::Removed,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => NativeChangeKind::Modified,
        // Reads and opens do not change anything.
        EventKind::Access(_) => return Vec::new(),
        other @ (EventKind::Any | EventKind::Other) => NativeChangeKind::Unknown(format!("{other:?}")),
    };

    event
        .paths
        .into_iter()
        .map(|path| NativeEvent::Change {
            kind: kind.clone(),
            path,
        })
        .collect()
}

fn setup_error(root: &Path, err: notify::Error) -> WatchSetupError {
    let path = root.to_path_buf();
    match &err.kind {
        notify::ErrorKind::PathNotFound => WatchSetupError::PathMissing(path),
        notify::ErrorKind::Io(e) if e.kind() == io::ErrorKind::NotFound => {
            WatchSetupError::PathMissing(path)
        }
        notify::ErrorKind::Io(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            WatchSetupError::PermissionDenied(path)
        }
        notify::ErrorKind::Io(e) if e.raw_os_error() == Some(EMFILE) => {
            WatchSetupError::ResourceExhausted {
                path,
                message: err.to_string(),
            }
        }
        notify::ErrorKind::MaxFilesWatch => WatchSetupError::ResourceExhausted {
            path,
            message: err.to_string(),
        },
        _ => WatchSetupError::Backend {
            path,
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, Flag, RemoveKind, RenameMode};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |ev, p| ev.add_path(PathBuf::from(p)))
    }

    #[test]
    fn maps_basic_kinds() {
        let root = Path::new("/proj");
        assert_eq!(
            native_events(root, event(EventKind::Create(CreateKind::File), &["/proj/a"])),
            vec![NativeEvent::change(NativeChangeKind::Created, "/proj/a")]
        );
        assert_eq!(
            native_events(
                root,
                event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/proj/a"])
            ),
            vec![NativeEvent::change(NativeChangeKind::Modified, "/proj/a")]
        );
        assert_eq!(
            native_events(root, event(EventKind::Remove(RemoveKind::Folder), &["/proj/b"])),
            vec![NativeEvent::change(NativeChangeKind::Removed, "/proj/b")]
        );
    }

    #[test]
    fn rename_emits_one_event_per_path() {
        let ev = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/proj/old", "/proj/new"],
        );
        assert_eq!(
            native_events(Path::new("/proj"), ev),
            vec![
                NativeEvent::change(NativeChangeKind::Renamed, "/proj/old"),
                NativeEvent::change(NativeChangeKind::Renamed, "/proj/new"),
            ]
        );
    }

    #[test]
    fn read_access_is_not_a_change_but_close_write_is() {
        let root = Path::new("/proj");
        assert!(native_events(root, event(EventKind::Access(AccessKind::Any), &["/proj/a"])).is_empty());
        assert_eq!(
            native_events(
                root,
                event(EventKind::Access(AccessKind::Close(AccessMode::Write)), &["/proj/a"])
            ),
            vec![NativeEvent::change(NativeChangeKind::Modified, "/proj/a")]
        );
    }

    #[test]
    fn other_kinds_are_unknown() {
        let events = native_events(Path::new("/proj"), event(EventKind::Other, &["/proj/a"]));
        assert!(matches!(
            events.as_slice(),
            [NativeEvent::Change { kind: NativeChangeKind::Unknown(_), .. }]
        ));
    }

    #[test]
    fn rescan_flag_becomes_overflow_for_the_watch_root() {
        let ev = Event::new(EventKind::Other).set_flag(Flag::Rescan);
        assert_eq!(
            native_events(Path::new("/proj"), ev),
            vec![NativeEvent::Overflow {
                root: PathBuf::from("/proj")
            }]
        );
    }

    #[test]
    fn setup_errors_are_classified() {
        let root = Path::new("/proj");
        assert_eq!(
            setup_error(root, notify::Error::path_not_found()),
            WatchSetupError::PathMissing(root.to_path_buf())
        );
        assert!(matches!(
            setup_error(root, notify::Error::new(notify::ErrorKind::MaxFilesWatch)),
            WatchSetupError::ResourceExhausted { .. }
        ));
        assert_eq!(
            setup_error(
                root,
                notify::Error::io(io::Error::from(io::ErrorKind::PermissionDenied))
            ),
            WatchSetupError::PermissionDenied(root.to_path_buf())
        );
        assert!(matches!(
            setup_error(root, notify::Error::generic("boom")),
            WatchSetupError::Backend { .. }
        ));
    }

    #[test]
    fn starting_on_a_missing_directory_fails_for_that_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut backend = NotifyBackend::new(tx);

        let err = backend.start(&missing).unwrap_err();
        assert_eq!(err.path(), &missing);
    }

    #[test]
    fn start_then_stop_on_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut backend = NotifyBackend::new(tx);

        let handle = backend.start(dir.path()).unwrap();
        assert_eq!(handle.root(), dir.path());
        backend.stop(handle).unwrap();
    }
}
