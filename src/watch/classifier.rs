// src/watch/classifier.rs

//! Maps raw native events onto the four canonical change kinds.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::errors::ReceiveError;
use crate::registry::statistics::StatisticsCollector;
use crate::types::{ChangeEvent, ChangeType};
use crate::watch::backend::{NativeChangeKind, NativeEvent, WatcherBackend};
use crate::watch::hierarchies::HierarchySet;

/// Outcome of classifying one native event that was not dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Change(ChangeEvent),
    /// Nothing known under `root` can be trusted any more.
    LostState { root: PathBuf },
}

/// Classify a single native event.
///
/// Every event counts towards the received-events statistic. Events outside
/// every watched hierarchy return `None`; they come from watches whose
/// removal raced with in-flight delivery. One event never yields more than
/// one change, and events are not coalesced.
pub fn classify<B: WatcherBackend>(
    event: NativeEvent,
    hierarchies: &HierarchySet<B>,
    stats: &mut StatisticsCollector,
) -> Option<Classified> {
    stats.record_event();

    match event {
        NativeEvent::Change { kind, path } => {
            if !hierarchies.is_watched(&path) {
                debug!(?path, "dropping event outside watched hierarchies");
                return None;
            }
            let kind = match kind {
                NativeChangeKind::Created => ChangeType::Created,
                NativeChangeKind::Modified => ChangeType::Modified,
                NativeChangeKind::Removed => ChangeType::Removed,
                NativeChangeKind::Renamed => ChangeType::Invalidated,
                NativeChangeKind::Unknown(raw) => {
                    debug!(?path, raw = %raw, "unknown native event kind; invalidating");
                    stats.record_unknown_event();
                    ChangeType::Invalidated
                }
            };
            Some(Classified::Change(ChangeEvent { kind, path }))
        }
        NativeEvent::Overflow { root } => {
            if !hierarchies.is_watched(&root) {
                debug!(?root, "dropping overflow for unwatched hierarchy");
                return None;
            }
            warn!(?root, "native watcher lost events");
            stats.record_error(ReceiveError::LostState { root: root.clone() });
            Some(Classified::LostState { root })
        }
        NativeEvent::Error { root, message } => {
            if !hierarchies.is_watched(&root) {
                debug!(?root, %message, "dropping error for unwatched hierarchy");
                return None;
            }
            warn!(?root, %message, "native watcher error");
            stats.record_error(ReceiveError::Backend {
                root: root.clone(),
                message,
            });
            Some(Classified::LostState { root })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WatchSetupError;
    use std::io;
    use std::path::Path;

    struct Noop;

    impl WatcherBackend for Noop {
        type Handle = ();

        fn start(&mut self, _root: &Path) -> Result<(), WatchSetupError> {
            Ok(())
        }

        fn stop(&mut self, _handle: ()) -> io::Result<()> {
            Ok(())
        }
    }

    fn watching(root: &str) -> HierarchySet<Noop> {
        let mut set = HierarchySet::new(Noop, Vec::new());
        set.add(Path::new(root)).unwrap();
        set
    }

    #[test]
    fn maps_known_kinds_one_to_one() {
        let set = watching("/proj");
        let mut stats = StatisticsCollector::new();

        let cases = [
            (NativeChangeKind::Created, ChangeType::Created),
            (NativeChangeKind::Modified, ChangeType::Modified),
            (NativeChangeKind::Removed, ChangeType::Removed),
            (NativeChangeKind::Renamed, ChangeType::Invalidated),
        ];
        for (native, expected) in cases {
            let got = classify(NativeEvent::change(native, "/proj/a"), &set, &mut stats);
            assert_eq!(got, Some(Classified::Change(ChangeEvent::new(expected, "/proj/a"))));
        }

        let stats = stats.get_and_reset(set.len());
        assert_eq!(stats.number_of_received_events, 4);
        assert!(!stats.unknown_event_encountered);
        assert!(stats.error_while_receiving_file_changes.is_none());
    }

    #[test]
    fn unknown_kind_invalidates_and_flags() {
        let set = watching("/proj");
        let mut stats = StatisticsCollector::new();

        let got = classify(
            NativeEvent::change(NativeChangeKind::Unknown("Other".into()), "/proj/a"),
            &set,
            &mut stats,
        );

        assert_eq!(
            got,
            Some(Classified::Change(ChangeEvent::new(ChangeType::Invalidated, "/proj/a")))
        );
        assert!(stats.get_and_reset(1).unknown_event_encountered);
    }

    #[test]
    fn events_outside_watched_hierarchies_are_dropped_but_counted() {
        let set = watching("/proj");
        let mut stats = StatisticsCollector::new();

        assert_eq!(
            classify(NativeEvent::change(NativeChangeKind::Created, "/elsewhere/a"), &set, &mut stats),
            None
        );
        assert_eq!(
            classify(NativeEvent::Overflow { root: "/elsewhere".into() }, &set, &mut stats),
            None
        );

        let stats = stats.get_and_reset(1);
        assert_eq!(stats.number_of_received_events, 2);
        assert!(stats.error_while_receiving_file_changes.is_none());
    }

    #[test]
    fn overflow_and_errors_become_lost_state() {
        let set = watching("/proj");
        let mut stats = StatisticsCollector::new();

        assert_eq!(
            classify(NativeEvent::Overflow { root: "/proj".into() }, &set, &mut stats),
            Some(Classified::LostState { root: "/proj".into() })
        );
        assert_eq!(
            classify(
                NativeEvent::Error {
                    root: "/proj".into(),
                    message: "gone".into()
                },
                &set,
                &mut stats
            ),
            Some(Classified::LostState { root: "/proj".into() })
        );

        assert_eq!(
            stats.get_and_reset(1).error_while_receiving_file_changes,
            Some(ReceiveError::LostState { root: "/proj".into() })
        );
    }
}
