//! Periodic probing.
//!
//! # Responsibilities
//! - Run one probe round immediately, then one per tick
//! - Fold every round into the shared aggregator
//! - Stop ticking when asked (or when the handle is dropped)
//!
//! # Design Decisions
//! - The per-check timeout equals the probe period
//! - Rounds run inline on the driver task, so they never overlap
//! - Ticks missed while a round runs are skipped, not queued
//! - Stopping never cancels an in-flight round; `join` waits for it

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::health::aggregator::StatusAggregator;
use crate::health::checkable::Checkable;
use crate::health::round::run_round;
use crate::observability::metrics;

/// Error returned when a monitor cannot be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("probe period must be greater than zero")]
    ZeroPeriod,

    #[error("service id `{0}` is registered more than once")]
    DuplicateServiceId(String),
}

/// Drives probe rounds for a fixed set of checkables.
pub struct HealthMonitor {
    period: Duration,
    aggregator: Arc<StatusAggregator>,
    checkables: Vec<Arc<Checkable>>,
}

impl HealthMonitor {
    pub fn new(
        period: Duration,
        aggregator: Arc<StatusAggregator>,
        checkables: Vec<Checkable>,
    ) -> Result<Self, ProbeError> {
        if period.is_zero() {
            return Err(ProbeError::ZeroPeriod);
        }

        let mut seen = HashSet::new();
        for c in &checkables {
            if !seen.insert(c.service_id()) {
                return Err(ProbeError::DuplicateServiceId(c.service_id().to_string()));
            }
        }

        Ok(Self {
            period,
            aggregator,
            checkables: checkables.into_iter().map(Arc::new).collect(),
        })
    }

    /// Spawn the driver task. With nothing to probe no task is spawned.
    pub fn start(self) -> MonitorHandle {
        if self.checkables.is_empty() {
            tracing::info!("No dependencies registered, health monitor not started");
            return MonitorHandle::noop();
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));

        MonitorHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    async fn run(self, mut stop: watch::Receiver<bool>) {
        tracing::info!(
            interval_ms = self.period.as_millis() as u64,
            dependencies = self.checkables.len(),
            "Health monitor starting"
        );

        // The first tick completes immediately, giving the startup round.
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        tracing::info!("Health monitor stopped");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.probe().await;
                }
            }
        }
    }

    async fn probe(&self) {
        let started = Instant::now();
        let outcomes = run_round(self.period, &self.checkables).await;
        let verdict = self.aggregator.apply_round(&outcomes);
        let elapsed = started.elapsed();

        metrics::record_round(elapsed, outcomes.len());

        let unhealthy = outcomes.iter().filter(|o| !o.ok()).count();
        tracing::info!(
            healthy = outcomes.len() - unhealthy,
            unhealthy,
            startup_ok = verdict.startup_ok,
            ready_ok = verdict.ready_ok,
            live_ok = verdict.live_ok,
            elapsed_ms = elapsed.as_millis() as u64,
            "Probe round complete"
        );
    }
}

/// Start probing `checkables` every `period`, folding results into `aggregator`.
///
/// Returns a no-op handle when `checkables` is empty.
pub fn start(
    period: Duration,
    aggregator: Arc<StatusAggregator>,
    checkables: Vec<Checkable>,
) -> Result<MonitorHandle, ProbeError> {
    Ok(HealthMonitor::new(period, aggregator, checkables)?.start())
}

/// Handle to a running health monitor. Dropping it stops the monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// A handle with no background work behind it.
    pub fn noop() -> Self {
        Self {
            stop_tx: None,
            task: None,
        }
    }

    /// Stop scheduling new rounds. A round already running still completes and
    /// is applied; this call does not wait for it.
    pub fn stop(&self) {
        if let Some(tx) = &self.stop_tx {
            let _ = tx.send(true);
        }
    }

    /// Stop the monitor and wait for the driver task to exit.
    ///
    /// A round in flight completes and is applied before this returns, so it
    /// waits at most one period.
    pub async fn join(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Health monitor task failed");
            }
        }
    }

    /// Whether the driver task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::checkable::{check_fn, CheckError};
    use crate::health::status::{Health, StatusKey};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(id: &str, calls: Arc<AtomicUsize>, ok: bool) -> Checkable {
        let check = check_fn(move |_ctx| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if ok {
                    Ok(())
                } else {
                    Err(CheckError::new("unreachable"))
                }
            }
        });
        Checkable::new(id, [StatusKey::Ready, StatusKey::Live], check).unwrap()
    }

    #[tokio::test]
    async fn test_empty_registration_is_noop() {
        let agg = Arc::new(StatusAggregator::new());
        let handle = start(Duration::from_millis(10), agg.clone(), Vec::new()).unwrap();

        assert!(!handle.is_running());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snap = agg.snapshot();
        assert!(snap.last_round_at.is_none());
        assert!(snap.dependencies.is_empty());
        handle.stop();
    }

    #[tokio::test]
    async fn test_first_round_runs_immediately() {
        let agg = Arc::new(StatusAggregator::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let _handle = start(
            Duration::from_secs(3600),
            agg.clone(),
            vec![counting("db", calls.clone(), false)],
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snap = agg.snapshot();
        assert_eq!(snap.ready, Health::NotOk);
        assert_eq!(snap.live, Health::NotOk);
        assert_eq!(snap.startup, Health::Ok);
    }

    #[tokio::test]
    async fn test_rounds_repeat_on_every_tick() {
        let agg = Arc::new(StatusAggregator::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = start(
            Duration::from_millis(50),
            agg,
            vec![counting("db", calls.clone(), true)],
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(280)).await;
        handle.stop();

        let n = calls.load(Ordering::SeqCst);
        assert!(n >= 4, "expected at least 4 rounds, got {}", n);
    }

    #[tokio::test]
    async fn test_stop_halts_ticks_and_keeps_status() {
        let agg = Arc::new(StatusAggregator::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = start(
            Duration::from_millis(40),
            agg.clone(),
            vec![counting("db", calls.clone(), false)],
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_stop = calls.load(Ordering::SeqCst);
        assert!(!handle.is_running());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
        assert_eq!(agg.snapshot().live, Health::NotOk);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_monitor() {
        let agg = Arc::new(StatusAggregator::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = start(
            Duration::from_millis(30),
            agg,
            vec![counting("db", calls.clone(), true)],
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn test_join_waits_for_in_flight_round() {
        let agg = Arc::new(StatusAggregator::new());
        let slow = check_fn(|_ctx| async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            Ok::<(), CheckError>(())
        });
        let mut handle = start(
            Duration::from_millis(500),
            agg.clone(),
            vec![Checkable::new("db", [StatusKey::Ready], slow).unwrap()],
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(agg.snapshot().last_round_at.is_none());

        handle.join().await;
        assert!(!handle.is_running());
        assert!(agg.snapshot().last_round_at.is_some());

        // Joining twice, or joining a no-op handle, returns immediately.
        handle.join().await;
        MonitorHandle::noop().join().await;
    }

    #[test]
    fn test_rejects_duplicate_ids_and_zero_period() {
        let agg = Arc::new(StatusAggregator::new());
        let dupes = vec![
            Checkable::always_ok("db", [StatusKey::Ready]).unwrap(),
            Checkable::always_ok("db", [StatusKey::Live]).unwrap(),
        ];
        let err = HealthMonitor::new(Duration::from_secs(1), agg.clone(), dupes).err();
        assert_eq!(err, Some(ProbeError::DuplicateServiceId("db".into())));

        let err = HealthMonitor::new(Duration::ZERO, agg, Vec::new()).err();
        assert_eq!(err, Some(ProbeError::ZeroPeriod));
    }
}
