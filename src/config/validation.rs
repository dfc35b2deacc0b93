//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject empty or duplicate dependency ids
//! - Validate addresses, URLs and the probe interval
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{AppConfig, CheckConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("probe.interval_secs must be greater than zero")]
    ZeroInterval,

    #[error("invalid {field} `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("dependency #{index} has an empty id")]
    EmptyDependencyId { index: usize },

    #[error("dependency id `{0}` is declared more than once")]
    DuplicateDependencyId(String),

    #[error("dependency `{id}`: tcp address must not be empty")]
    EmptyTcpAddress { id: String },

    #[error("dependency `{id}`: invalid http url `{url}`")]
    InvalidUrl { id: String, url: String },
}

/// Check the configuration for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.probe.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut seen = HashSet::new();
    for (index, dep) in config.dependencies.iter().enumerate() {
        let id = dep.id.trim();
        if id.is_empty() {
            errors.push(ValidationError::EmptyDependencyId { index });
            continue;
        }
        if !seen.insert(id) {
            errors.push(ValidationError::DuplicateDependencyId(id.to_string()));
        }

        match &dep.check {
            CheckConfig::Tcp { address } if address.trim().is_empty() => {
                errors.push(ValidationError::EmptyTcpAddress { id: id.to_string() });
            }
            CheckConfig::Http { url, .. } => {
                let valid = Url::parse(url)
                    .map(|u| u.scheme() == "http" && u.host().is_some())
                    .unwrap_or(false);
                if !valid {
                    errors.push(ValidationError::InvalidUrl {
                        id: id.to_string(),
                        url: url.clone(),
                    });
                }
            }
            CheckConfig::Tcp { .. } => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
