//! Dependency checks built from configuration.
//!
//! # Data Flow
//! ```text
//! [[dependencies]] in config
//!     → build_checkable
//!     → tcp.rs / http.rs (`Check` implementations)
//!     → Checkable handed to the health monitor
//! ```
//!
//! # Design Decisions
//! - Config checks are ordinary `Check` implementations; the engine has no special cases
//! - Checks honor the context deadline themselves as well as being bounded by the round

pub mod http;
pub mod tcp;

use axum::http::{StatusCode, Uri};

use crate::config::schema::{CheckConfig, DependencyConfig};
use crate::health::checkable::{Checkable, RegistrationError};

pub use self::http::HttpCheck;
pub use self::tcp::TcpCheck;

/// Error building a checkable from configuration.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("dependency `{id}`: invalid url `{url}`: {source}")]
    InvalidUri {
        id: String,
        url: String,
        source: axum::http::uri::InvalidUri,
    },

    #[error("dependency `{id}`: invalid expected status {status}")]
    InvalidStatus { id: String, status: u16 },
}

/// Turn one `[[dependencies]]` entry into a registered checkable.
pub fn build_checkable(config: &DependencyConfig) -> Result<Checkable, BuildError> {
    let id = config.id.trim();
    let affects = config.affects.iter().copied();

    let checkable = match &config.check {
        CheckConfig::Tcp { address } => Checkable::new(id, affects, TcpCheck::new(address.clone()))?,
        CheckConfig::Http { url, expect_status } => {
            let uri: Uri = url.parse().map_err(|source| BuildError::InvalidUri {
                id: id.to_string(),
                url: url.clone(),
                source,
            })?;
            let expect_status = expect_status
                .map(|status| {
                    StatusCode::from_u16(status).map_err(|_| BuildError::InvalidStatus {
                        id: id.to_string(),
                        status,
                    })
                })
                .transpose()?;
            Checkable::new(id, affects, HttpCheck::new(uri, expect_status))?
        }
    };

    Ok(checkable)
}

/// Build every configured dependency, stopping at the first error.
pub fn build_all(configs: &[DependencyConfig]) -> Result<Vec<Checkable>, BuildError> {
    configs.iter().map(build_checkable).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::status::StatusKey;

    #[test]
    fn test_build_from_config() {
        let configs = vec![
            DependencyConfig {
                id: " postgres ".into(),
                affects: vec![StatusKey::Live, StatusKey::Ready],
                check: CheckConfig::Tcp { address: "127.0.0.1:5432".into() },
            },
            DependencyConfig {
                id: "search".into(),
                affects: vec![],
                check: CheckConfig::Http {
                    url: "http://127.0.0.1:9200/health".into(),
                    expect_status: Some(204),
                },
            },
        ];

        let checkables = build_all(&configs).unwrap();
        assert_eq!(checkables[0].service_id(), "postgres");
        assert!(checkables[0].affects(StatusKey::Live));
        assert_eq!(checkables[1].service_id(), "search");
        assert!(checkables[1].affected_statuses().is_empty());
    }

    #[test]
    fn test_bad_status_is_rejected() {
        let config = DependencyConfig {
            id: "search".into(),
            affects: vec![StatusKey::Ready],
            check: CheckConfig::Http {
                url: "http://127.0.0.1:9200/".into(),
                expect_status: Some(42),
            },
        };
        assert!(matches!(build_checkable(&config), Err(BuildError::InvalidStatus { status: 42, .. })));
    }
}
