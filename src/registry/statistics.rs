// src/registry/statistics.rs

//! Per-cycle watcher health counters.

use crate::errors::ReceiveError;

/// Snapshot of the counters accumulated since the previous read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileWatchingStatistics {
    /// First error observed while receiving changes, if any.
    pub error_while_receiving_file_changes: Option<ReceiveError>,
    /// Whether any native event of an unrecognized kind arrived.
    pub unknown_event_encountered: bool,
    /// Raw native events received, including dropped ones.
    pub number_of_received_events: usize,
    /// Hierarchies under native watch at the time of the read.
    pub number_of_watched_hierarchies: usize,
}

/// Running totals for the current accumulation window.
#[derive(Debug, Default)]
pub struct StatisticsCollector {
    error: Option<ReceiveError>,
    unknown_event_encountered: bool,
    received_events: usize,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.received_events += 1;
    }

    pub fn record_unknown_event(&mut self) {
        self.unknown_event_encountered = true;
    }

    /// Keeps only the first error of the window.
    pub fn record_error(&mut self, error: ReceiveError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Return the accumulated values and start a fresh window.
    pub fn get_and_reset(&mut self, watched_hierarchies: usize) -> FileWatchingStatistics {
        let taken = std::mem::take(self);
        FileWatchingStatistics {
            error_while_receiving_file_changes: taken.error,
            unknown_event_encountered: taken.unknown_event_encountered,
            number_of_received_events: taken.received_events,
            number_of_watched_hierarchies: watched_hierarchies,
        }
    }
}
