// src/registry/event_loop.rs

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::registry::handler::ChangeHandler;
use crate::registry::FileWatcherRegistry;
use crate::watch::backend::{NativeEvent, WatcherBackend};

/// Spawn a task that feeds backend events into `registry`, in arrival order.
///
/// The task ends when the channel closes or the registry is closed; events
/// still queued at that point are dropped.
pub fn spawn_event_loop<B, H>(
    registry: FileWatcherRegistry<B, H>,
    mut event_rx: mpsc::UnboundedReceiver<NativeEvent>,
) -> JoinHandle<()>
where
    B: WatcherBackend + 'static,
    H: ChangeHandler + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received native event");
            if !registry.handle_native_event(event) {
                break;
            }
        }
        debug!("registry event loop finished");
    })
}
