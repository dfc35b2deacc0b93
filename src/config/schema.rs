//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the health
//! responder. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::health::status::StatusKey;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Process metadata rendered by the health endpoint.
    pub service: ServiceConfig,

    /// Health responder listener.
    pub listener: ListenerConfig,

    /// Probe scheduling.
    pub probe: ProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Dependencies to probe.
    pub dependencies: Vec<DependencyConfig>,
}

/// Process metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Application name.
    pub name: String,

    /// Deployment environment (e.g., "local", "staging", "production").
    pub environment: String,

    /// Application version.
    pub version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            environment: "local".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Listener configuration for the health responder.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2000").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:2000".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Probe scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Interval between probe rounds in seconds. Also the per-check timeout.
    pub interval_secs: u64,

    /// How long to keep serving after readiness is dropped on shutdown.
    /// Defaults to the probe interval.
    pub shutdown_drain_secs: Option<u64>,
}

impl ProbeConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }

    pub fn shutdown_drain(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.shutdown_drain_secs.unwrap_or(self.interval_secs))
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            shutdown_drain_secs: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A dependency whose health is probed every round.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyConfig {
    /// Unique dependency identifier, shown in the health snapshot.
    pub id: String,

    /// Status keys degraded when this dependency fails.
    #[serde(default)]
    pub affects: Vec<StatusKey>,

    /// How to probe the dependency.
    pub check: CheckConfig,
}

/// Probe kinds available from configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CheckConfig {
    /// Open a TCP connection to `address` (e.g., "127.0.0.1:5432").
    Tcp { address: String },

    /// Issue `GET url`; healthy on `expect_status`, or any 2xx when unset.
    Http {
        url: String,
        #[serde(default)]
        expect_status: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:2000");
        assert_eq!(config.probe.interval_secs, 3);
        assert_eq!(config.probe.shutdown_drain(), config.probe.interval());
        assert!(config.dependencies.is_empty());
    }

    #[test]
    fn test_parse_dependencies() {
        let config: AppConfig = toml::from_str(
            r#"
            [service]
            environment = "production"

            [probe]
            interval_secs = 10
            shutdown_drain_secs = 2

            [[dependencies]]
            id = "postgres"
            affects = ["live", "ready"]
            check = { kind = "tcp", address = "127.0.0.1:5432" }

            [[dependencies]]
            id = "search"
            affects = ["ready"]
            check = { kind = "http", url = "http://127.0.0.1:9200/_cluster/health", expect_status = 200 }
            "#,
        )
        .unwrap();

        assert_eq!(config.service.environment, "production");
        assert_eq!(config.probe.shutdown_drain().as_secs(), 2);
        assert_eq!(config.dependencies.len(), 2);
        assert_eq!(config.dependencies[0].affects, vec![StatusKey::Live, StatusKey::Ready]);
        assert_eq!(
            config.dependencies[0].check,
            CheckConfig::Tcp { address: "127.0.0.1:5432".into() }
        );
        assert_eq!(
            config.dependencies[1].check,
            CheckConfig::Http {
                url: "http://127.0.0.1:9200/_cluster/health".into(),
                expect_status: Some(200),
            }
        );
    }
}
