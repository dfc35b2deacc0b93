//! Dependency health probing and status aggregation.

pub mod checks;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use health::{Checkable, HealthSnapshot, StatusAggregator, StatusKey};
pub use http::HealthServer;
pub use lifecycle::{App, Shutdown};
