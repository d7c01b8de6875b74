//! Sync status reported to presentation layers.

use serde::{Deserialize, Serialize};

/// The entire sync contract exposed outward.
///
/// Transient: recomputed by the sync engine and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// A push or pull is in flight
    pub is_syncing: bool,
    /// Epoch milliseconds of the last successful sync
    pub last_sync_time: Option<i64>,
    /// Last surfaced error, if any
    pub error: Option<String>,
}

impl SyncStatus {
    /// Whether an error is currently surfaced.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
