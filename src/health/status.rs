//! Readiness dimensions and their rendered health.
//!
//! # States
//! - `startup`: the process finished initializing its dependencies
//! - `ready`: the process can take traffic
//! - `live`: the process should not be restarted
//!
//! # Design Decisions
//! - Keys are plain `Copy` tokens; the engine only compares them
//! - Rendered values are `"ok"` / `"not-ok"`, matching orchestrator probe bodies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named readiness dimension influenced by one or more dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKey {
    Startup,
    Ready,
    Live,
}

impl StatusKey {
    /// All keys, in rendering order.
    pub const ALL: [StatusKey; 3] = [StatusKey::Startup, StatusKey::Ready, StatusKey::Live];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKey::Startup => "startup",
            StatusKey::Ready => "ready",
            StatusKey::Live => "live",
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status key.
#[derive(Debug, thiserror::Error)]
#[error("unknown status key `{0}` (expected startup, ready or live)")]
pub struct UnknownStatusKey(pub String);

impl FromStr for StatusKey {
    type Err = UnknownStatusKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "startup" => Ok(StatusKey::Startup),
            "ready" => Ok(StatusKey::Ready),
            "live" => Ok(StatusKey::Live),
            other => Err(UnknownStatusKey(other.to_string())),
        }
    }
}

/// Rendered health of a single dependency or status key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "not-ok")]
    NotOk,
}

impl Health {
    pub fn from_ok(ok: bool) -> Self {
        if ok {
            Health::Ok
        } else {
            Health::NotOk
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Health::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Ok => "ok",
            Health::NotOk => "not-ok",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
