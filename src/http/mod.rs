//! Health responder HTTP surface.
//!
//! # Data Flow
//! ```text
//! GET /-/health
//!     → server.rs (metadata + aggregator snapshot → JSON, always 200)
//!
//! GET /-/startup | /-/ready | /-/live
//!     → server.rs (200 "ok" / 503 "not-ok" for that status key)
//! ```

pub mod server;

pub use server::{render_health, AppState, HealthServer, ServiceMetadata, HEALTH_PATH};
