//! Shared aggregate health state.
//!
//! # Responsibilities
//! - Hold the latest textual outcome per dependency
//! - Hold one failure flag per status key
//! - Fold a whole probe round into that state in one critical section
//! - Hand out consistent snapshots to the health endpoints
//!
//! # Design Decisions
//! - A single `RwLock` guards the map and all flags together
//! - A round replaces the map wholesale; there is no history
//! - Snapshots are owned copies, never guards

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::health::round::ProbeOutcome;
use crate::health::status::{Health, StatusKey};
use crate::observability::metrics;

/// Per-round verdict for each status key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundVerdict {
    pub startup_ok: bool,
    pub ready_ok: bool,
    pub live_ok: bool,
}

impl RoundVerdict {
    pub fn is_ok(&self, key: StatusKey) -> bool {
        match key {
            StatusKey::Startup => self.startup_ok,
            StatusKey::Ready => self.ready_ok,
            StatusKey::Live => self.live_ok,
        }
    }
}

/// AND-reduce the outcomes of one round per status key.
///
/// A key is ok iff every outcome affecting it is ok; keys nothing affects stay ok.
pub fn fold(outcomes: &[ProbeOutcome]) -> RoundVerdict {
    let mut verdict = RoundVerdict {
        startup_ok: true,
        ready_ok: true,
        live_ok: true,
    };

    for outcome in outcomes {
        let ok = outcome.ok();
        for key in &outcome.affected_statuses {
            match key {
                StatusKey::Startup => verdict.startup_ok &= ok,
                StatusKey::Ready => verdict.ready_ok &= ok,
                StatusKey::Live => verdict.live_ok &= ok,
            }
        }
    }

    verdict
}

#[derive(Debug, Default)]
struct AggregateStatus {
    dependencies: BTreeMap<String, String>,
    startup_failed: bool,
    ready_failed: bool,
    live_failed: bool,
    last_round_at: Option<DateTime<Utc>>,
}

impl AggregateStatus {
    fn flag_mut(&mut self, key: StatusKey) -> &mut bool {
        match key {
            StatusKey::Startup => &mut self.startup_failed,
            StatusKey::Ready => &mut self.ready_failed,
            StatusKey::Live => &mut self.live_failed,
        }
    }

    fn failed(&self, key: StatusKey) -> bool {
        match key {
            StatusKey::Startup => self.startup_failed,
            StatusKey::Ready => self.ready_failed,
            StatusKey::Live => self.live_failed,
        }
    }
}

/// Point-in-time copy of the aggregate state.
///
/// Serializes as one flat object: every dependency id mapped to its summary,
/// plus `startup`, `ready` and `live` valued `ok` / `not-ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "BTreeMap<String, String>")]
pub struct HealthSnapshot {
    pub dependencies: BTreeMap<String, String>,
    pub startup: Health,
    pub ready: Health,
    pub live: Health,
    pub last_round_at: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    pub fn status(&self, key: StatusKey) -> Health {
        match key {
            StatusKey::Startup => self.startup,
            StatusKey::Ready => self.ready,
            StatusKey::Live => self.live,
        }
    }

    /// True when every status key is ok.
    pub fn all_ok(&self) -> bool {
        StatusKey::ALL.iter().all(|k| self.status(*k).is_ok())
    }
}

impl From<HealthSnapshot> for BTreeMap<String, String> {
    fn from(snapshot: HealthSnapshot) -> Self {
        let mut map = snapshot.dependencies;
        // Status keys win over a dependency that happens to share their name.
        for key in StatusKey::ALL {
            let value = match key {
                StatusKey::Startup => snapshot.startup,
                StatusKey::Ready => snapshot.ready,
                StatusKey::Live => snapshot.live,
            };
            map.insert(key.to_string(), value.to_string());
        }
        map
    }
}

/// Aggregated dependency health shared between the monitor and the health endpoints.
#[derive(Debug, Default)]
pub struct StatusAggregator {
    state: RwLock<AggregateStatus>,
}

impl StatusAggregator {
    /// A fresh aggregator: empty map, every key healthy.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, AggregateStatus> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AggregateStatus> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Upsert the display string for one dependency.
    pub fn record_outcome(&self, service_id: impl Into<String>, summary: impl Into<String>) {
        self.write().dependencies.insert(service_id.into(), summary.into());
    }

    pub fn set_failed(&self, key: StatusKey, failed: bool) {
        let mut state = self.write();
        let flag = state.flag_mut(key);
        if *flag != failed {
            log_transition(key, failed);
        }
        *flag = failed;
        metrics::record_status(key, !failed);
    }

    pub fn set_startup_failed(&self, failed: bool) {
        self.set_failed(StatusKey::Startup, failed);
    }

    pub fn set_ready_failed(&self, failed: bool) {
        self.set_failed(StatusKey::Ready, failed);
    }

    pub fn set_live_failed(&self, failed: bool) {
        self.set_failed(StatusKey::Live, failed);
    }

    /// Fold one complete round into the state.
    ///
    /// The dependency map and all three flags are replaced under a single write
    /// lock, so readers see either the previous round or this one.
    pub fn apply_round(&self, outcomes: &[ProbeOutcome]) -> RoundVerdict {
        let verdict = fold(outcomes);
        let dependencies: BTreeMap<String, String> = outcomes
            .iter()
            .map(|o| (o.service_id.clone(), o.summary()))
            .collect();

        {
            let mut state = self.write();
            for key in StatusKey::ALL {
                let failed = !verdict.is_ok(key);
                let flag = state.flag_mut(key);
                if *flag != failed {
                    log_transition(key, failed);
                }
                *flag = failed;
            }
            state.dependencies = dependencies;
            state.last_round_at = Some(Utc::now());
        }

        for key in StatusKey::ALL {
            metrics::record_status(key, verdict.is_ok(key));
        }

        verdict
    }

    /// Read-consistent copy of the current state.
    pub fn snapshot(&self) -> HealthSnapshot {
        let state = self.read();
        HealthSnapshot {
            dependencies: state.dependencies.clone(),
            startup: Health::from_ok(!state.startup_failed),
            ready: Health::from_ok(!state.ready_failed),
            live: Health::from_ok(!state.live_failed),
            last_round_at: state.last_round_at,
        }
    }

    pub fn is_healthy(&self, key: StatusKey) -> bool {
        !self.read().failed(key)
    }
}

fn log_transition(key: StatusKey, failed: bool) {
    if failed {
        tracing::warn!(status = %key, "Status is now not-ok");
    } else {
        tracing::info!(status = %key, "Status is now ok");
    }
}
