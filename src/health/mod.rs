//! Dependency health probing subsystem.
//!
//! # Data Flow
//! ```text
//! Probe rounds (scheduler.rs):
//!     Immediate round, then one per tick
//!     → round.rs (one task per checkable, bounded fan-in)
//!     → aggregator.rs (fold the round under one write lock)
//!
//! Health endpoints:
//!     → aggregator.rs snapshot (owned copy)
//!     → JSON / probe responses
//! ```
//!
//! # Design Decisions
//! - A status key is not-ok iff a dependency affecting it failed in the latest round
//! - Failures, timeouts and panics are all local to one dependency and one round
//! - The aggregator is constructed by the caller and shared via `Arc`; there is no global

pub mod aggregator;
pub mod checkable;
pub mod round;
pub mod scheduler;
pub mod status;

pub use aggregator::{fold, HealthSnapshot, RoundVerdict, StatusAggregator};
pub use checkable::{check_fn, Check, CheckContext, CheckError, CheckFn, Checkable, RegistrationError};
pub use round::{run_round, ProbeOutcome, ProbeResult};
pub use scheduler::{start, HealthMonitor, MonitorHandle, ProbeError};
pub use status::{Health, StatusKey};
