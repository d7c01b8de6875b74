//! Payloads exchanged with the remote sync endpoint.
//!
//! The endpoint is a fetch-style request/response pair: a pull returns the
//! whole remote copy, a push carries either or both of the keyed values.
//! Every response carries `success`, so "soft" failures (HTTP 200 with
//! `success: false`) can be told apart from transport failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Settings, Solve, TypesError};

/// Well-known error strings carried in `error` fields.
pub mod errors {
    /// Caller has no authenticated identity.
    pub const NOT_AUTHENTICATED: &str = "Not authenticated";
    /// Remote store is not provisioned; sync is permanently disabled.
    pub const NOT_CONFIGURED: &str = "KV storage not configured";
    /// Push carried malformed solves.
    pub const INVALID_SOLVES: &str = "Invalid solves data";
    /// Push carried malformed settings.
    pub const INVALID_SETTINGS: &str = "Invalid settings data";
    /// Remote read failed.
    pub const FETCH_FAILED: &str = "Failed to fetch data";
    /// Remote write failed.
    pub const SAVE_FAILED: &str = "Failed to save data";
}

/// Response to a pull (`GET`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    /// Whether the pull succeeded
    pub success: bool,
    /// Remote solve list (empty when absent)
    #[serde(default)]
    pub solves: Vec<Solve>,
    /// Remote settings, if ever pushed
    #[serde(default)]
    pub settings: Option<Settings>,
    /// When the remote copy was last written
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    /// Error message for soft failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PullResponse {
    /// A successful pull.
    pub fn ok(
        solves: Vec<Solve>,
        settings: Option<Settings>,
        last_sync: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            success: true,
            solves,
            settings,
            last_sync,
            error: None,
        }
    }

    /// A soft failure with an empty payload.
    pub fn failed(error: &str) -> Self {
        Self {
            success: false,
            solves: Vec::new(),
            settings: None,
            last_sync: None,
            error: Some(error.to_string()),
        }
    }

    /// `lastSync` as epoch milliseconds.
    pub fn last_sync_ms(&self) -> Option<i64> {
        self.last_sync.map(|t| t.timestamp_millis())
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, TypesError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TypesError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Body of a push (`POST`). Absent fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Full replacement solve list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solves: Option<Vec<Solve>>,
    /// Full replacement settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl PushRequest {
    /// Push only the solve list.
    pub fn solves(solves: Vec<Solve>) -> Self {
        Self {
            solves: Some(solves),
            settings: None,
        }
    }

    /// Push only the settings.
    pub fn settings(settings: Settings) -> Self {
        Self {
            solves: None,
            settings: Some(settings),
        }
    }

    /// Whether the request carries nothing.
    pub fn is_empty(&self) -> bool {
        self.solves.is_none() && self.settings.is_none()
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, TypesError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TypesError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Response to a push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// Whether the push was stored
    pub success: bool,
    /// Remote `lastSync` after the write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    /// Error message for failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushResponse {
    /// A successful push.
    pub fn ok(last_sync: Option<DateTime<Utc>>) -> Self {
        Self {
            success: true,
            last_sync,
            error: None,
        }
    }

    /// A failed push.
    pub fn failed(error: &str) -> Self {
        Self {
            success: false,
            last_sync: None,
            error: Some(error.to_string()),
        }
    }

    /// `lastSync` as epoch milliseconds.
    pub fn last_sync_ms(&self) -> Option<i64> {
        self.last_sync.map(|t| t.timestamp_millis())
    }
}
