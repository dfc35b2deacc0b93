//! Shutdown coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::health::{MonitorHandle, StatusAggregator};

/// Broadcast coordinator for long-running tasks (the health responder).
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// Subscribe before spawning the task that should observe shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Only the first call broadcasts.
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Take the process out of rotation before stopping the responder.
///
/// The monitor is stopped and joined first, so a round that was in flight has
/// already been applied when `ready` is marked failed. `ready` then stays
/// not-ok for `drain` before the shutdown broadcast fires.
pub async fn drain_and_stop(
    monitor: &mut MonitorHandle,
    aggregator: &StatusAggregator,
    drain: Duration,
    shutdown: &Shutdown,
) {
    monitor.join().await;
    aggregator.set_ready_failed(true);

    tracing::info!(drain_ms = drain.as_millis() as u64, "Readiness dropped, draining");
    tokio::time::sleep(drain).await;

    shutdown.trigger();
}
