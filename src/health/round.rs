//! Probe round execution.
//!
//! # Responsibilities
//! - Run every registered check concurrently, each on its own task
//! - Give every check its own full timeout budget
//! - Collect exactly one outcome per checkable before returning
//!
//! # Design Decisions
//! - Checks run on spawned tasks so a panic is trapped at the task boundary
//! - Timed out checks are aborted, never awaited past the budget
//! - Results arrive through a channel bounded to the round size (completion order)

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::health::checkable::{CheckContext, Checkable};
use crate::health::status::{Health, StatusKey};
use crate::observability::metrics;

/// How a single check ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The check completed without error inside its budget.
    Healthy,
    /// The check returned an error.
    Failed(String),
    /// The budget elapsed before the check completed.
    TimedOut(Duration),
    /// The check panicked.
    Faulted(String),
}

impl ProbeResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeResult::Healthy)
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeResult::Healthy => "ok",
            ProbeResult::Failed(_) => "failed",
            ProbeResult::TimedOut(_) => "timeout",
            ProbeResult::Faulted(_) => "panic",
        }
    }

    /// Human-readable failure reason, `None` when healthy.
    pub fn reason(&self) -> Option<String> {
        match self {
            ProbeResult::Healthy => None,
            ProbeResult::Failed(reason) => Some(reason.clone()),
            ProbeResult::TimedOut(budget) => Some(format!("timed out after {:?}", budget)),
            ProbeResult::Faulted(message) => Some(format!("check panicked: {}", message)),
        }
    }
}

/// Result of probing one checkable in one round.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub service_id: String,
    pub result: ProbeResult,
    pub affected_statuses: BTreeSet<StatusKey>,
    pub observed_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Display string stored in the aggregate map, e.g.
    /// `ok: 2024-05-01T10:00:00Z` or `not-ok: 2024-05-01T10:00:00Z: connection refused`.
    pub fn summary(&self) -> String {
        let at = self.observed_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        match self.result.reason() {
            None => format!("{}: {}", Health::Ok, at),
            Some(reason) => format!("{}: {}: {}", Health::NotOk, at, reason),
        }
    }
}

/// Probe every checkable once, concurrently, and wait for all outcomes.
///
/// Each check gets a fresh context with the full `timeout` budget. The returned
/// outcomes are in completion order.
pub async fn run_round(timeout: Duration, checkables: &[Arc<Checkable>]) -> Vec<ProbeOutcome> {
    if checkables.is_empty() {
        return Vec::new();
    }

    let total = checkables.len();
    let (tx, mut rx) = mpsc::channel(total);

    for checkable in checkables {
        let checkable = checkable.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = probe_one(timeout, checkable).await;
            // The receiver only goes away if the round itself was dropped.
            let _ = tx.send(outcome).await;
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
        if outcomes.len() >= total {
            break;
        }
    }

    outcomes
}

async fn probe_one(timeout: Duration, checkable: Arc<Checkable>) -> ProbeOutcome {
    let ctx = CheckContext::with_budget(timeout);
    let started = Instant::now();

    let task_checkable = checkable.clone();
    let mut handle = tokio::spawn(async move { task_checkable.check(ctx).await });

    let result = match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(Ok(()))) => ProbeResult::Healthy,
        Ok(Ok(Err(e))) => ProbeResult::Failed(e.to_string()),
        Ok(Err(join_err)) => ProbeResult::Faulted(describe_join_error(join_err)),
        Err(_) => {
            handle.abort();
            ProbeResult::TimedOut(timeout)
        }
    };

    let elapsed = started.elapsed();
    metrics::record_check(checkable.service_id(), result.label(), elapsed);

    match &result {
        ProbeResult::Healthy => {
            tracing::debug!(service_id = %checkable.service_id(), elapsed_ms = elapsed.as_millis() as u64, "Dependency check passed");
        }
        ProbeResult::Faulted(_) => {
            tracing::error!(service_id = %checkable.service_id(), reason = ?result.reason(), "Dependency check panicked");
        }
        _ => {
            tracing::warn!(service_id = %checkable.service_id(), reason = ?result.reason(), "Dependency check failed");
        }
    }

    ProbeOutcome {
        service_id: checkable.service_id().to_string(),
        result,
        affected_statuses: checkable.affected_statuses().clone(),
        observed_at: Utc::now(),
        elapsed,
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "check task cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
