//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → lifecycle::startup builds checks and the monitor from it
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; registered dependencies never change afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, CheckConfig, DependencyConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProbeConfig, ServiceConfig,
};
pub use validation::{validate_config, ValidationError};
