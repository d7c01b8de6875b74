//! Remote store abstraction for cubetime.
//!
//! This module provides a pluggable remote layer that abstracts the sync
//! endpoint (HTTP, mock for testing).
//!
//! # Design
//!
//! The remote is a fetch-style request/response pair:
//! - `pull()` returns the whole remote copy and its `lastSync`
//! - `push()` replaces whichever keyed values the request carries
//!
//! Soft failures (a 200 response with `success: false`) are turned into
//! [`RemoteError`]s here, so callers only ever see `Ok` for real successes.

mod http;
mod mock;

pub use http::HttpRemote;
pub use mock::MockRemote;

use async_trait::async_trait;
use cubetime_core::FailureKind;
use cubetime_types::{errors, PullResponse, PushRequest, PushResponse};
use thiserror::Error;

/// Remote store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Network unreachable, timeout or 5xx.
    #[error("transport error: {0}")]
    Transport(String),

    /// No authenticated identity (401).
    #[error("{}", errors::NOT_AUTHENTICATED)]
    Unauthenticated,

    /// Payload rejected as malformed (400).
    #[error("rejected: {0}")]
    Rejected(String),

    /// Remote store is not provisioned.
    #[error("{}", errors::NOT_CONFIGURED)]
    NotConfigured,

    /// Remote answered `success: false`.
    #[error("{0}")]
    Soft(String),

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Failure class driving the retry decision.
    pub fn kind(&self) -> FailureKind {
        match self {
            RemoteError::Transport(_) | RemoteError::Soft(_) | RemoteError::Decode(_) => {
                FailureKind::Transport
            }
            RemoteError::Unauthenticated => FailureKind::Unauthenticated,
            RemoteError::Rejected(_) => FailureKind::Rejected,
            RemoteError::NotConfigured => FailureKind::NotConfigured,
        }
    }

    /// Map the `error` field of a `success: false` response.
    pub fn from_soft(error: Option<&str>) -> Self {
        match error {
            Some(errors::NOT_CONFIGURED) => RemoteError::NotConfigured,
            Some(errors::NOT_AUTHENTICATED) => RemoteError::Unauthenticated,
            Some(other) => RemoteError::Soft(other.to_string()),
            None => RemoteError::Soft("Sync failed".to_string()),
        }
    }
}

/// Remote store for the two keyed values.
///
/// Implementations handle the underlying mechanism (HTTP, mock, etc).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the remote copy.
    async fn pull(&self) -> Result<PullResponse, RemoteError>;

    /// Replace the keyed values carried by `request`.
    async fn push(&self, request: PushRequest) -> Result<PushResponse, RemoteError>;
}

/// Turn a decoded pull into `Ok` only when it really succeeded.
pub(crate) fn check_pull(response: PullResponse) -> Result<PullResponse, RemoteError> {
    if response.success {
        Ok(response)
    } else {
        Err(RemoteError::from_soft(response.error.as_deref()))
    }
}

/// Turn a decoded push response into `Ok` only when it really succeeded.
pub(crate) fn check_push(response: PushResponse) -> Result<PushResponse, RemoteError> {
    if response.success {
        Ok(response)
    } else {
        Err(RemoteError::from_soft(response.error.as_deref()))
    }
}
