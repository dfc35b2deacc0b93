//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build checks → Start monitor → Serve health responder
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop probing → Drop readiness → Drain → Stop responder
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then checks and monitor, then the listener
//! - Readiness is dropped before the responder stops so orchestrators notice

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{drain_and_stop, Shutdown};
pub use signals::wait_for_signal;
pub use startup::{assemble, App, StartupError};
