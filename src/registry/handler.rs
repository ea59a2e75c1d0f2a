// src/registry/handler.rs

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::ChangeType;

/// Callback surface supplied by the registry's owner.
///
/// Both methods run synchronously inside the registry's critical section:
/// they must not call back into the registry and must not block for long.
/// Fan out through a channel if more work is needed.
pub trait ChangeHandler: Send {
    /// A change was folded into the snapshot.
    fn handle_change(&mut self, kind: ChangeType, path: &Path);

    /// A hierarchy's state was invalidated wholesale; re-scan before trusting it.
    fn handle_lost_state(&mut self);
}

/// Handler used by the `vfswatch` binary.
///
/// Prints every change to stdout and asks the main loop (through `rescan_tx`)
/// to re-scan after lost state, since the handler itself must not re-enter
/// the registry.
#[derive(Debug)]
pub struct ReportingHandler {
    rescan_tx: mpsc::UnboundedSender<()>,
}

impl ReportingHandler {
    pub fn new(rescan_tx: mpsc::UnboundedSender<()>) -> Self {
        Self { rescan_tx }
    }
}

impl ChangeHandler for ReportingHandler {
    fn handle_change(&mut self, kind: ChangeType, path: &Path) {
        println!("{kind:<11} {}", path.display());
    }

    fn handle_lost_state(&mut self) {
        warn!("watched state lost; requesting re-scan");
        if self.rescan_tx.send(()).is_err() {
            debug!("re-scan receiver gone; ignoring lost state");
        }
    }
}
