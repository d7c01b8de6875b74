//! Storage layer for cubetime-server.
//!
//! User data lives in a flat string KV store under three keys per user:
//!
//! ```text
//! user:{id}:solves     JSON array of solves
//! user:{id}:settings   JSON settings object
//! user:{id}:lastSync   RFC 3339 timestamp of the last write
//! ```
//!
//! [`UserStore`] layers the typed reads and writes on top of any
//! [`KvStore`] backend.

mod memory;
mod sqlite;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use cubetime_types::{Settings, Solve};
use std::sync::Arc;

/// Key patterns.
pub mod keys {
    /// Solve list key.
    pub fn solves(user_id: &str) -> String {
        format!("user:{}:solves", user_id)
    }

    /// Settings key.
    pub fn settings(user_id: &str) -> String {
        format!("user:{}:settings", user_id)
    }

    /// Last write timestamp key.
    pub fn last_sync(user_id: &str) -> String {
        format!("user:{}:lastSync", user_id)
    }
}

/// Trait for string KV backends.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Typed access to per-user data.
#[derive(Clone)]
pub struct UserStore {
    kv: Arc<dyn KvStore>,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore").finish_non_exhaustive()
    }
}

impl UserStore {
    /// Wrap a KV backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// The user's solves (empty when never written).
    pub async fn solves(&self, user_id: &str) -> Result<Vec<Solve>, StorageError> {
        let key = keys::solves(user_id);
        Ok(self.read_json(&key).await?.unwrap_or_default())
    }

    /// The user's settings, if ever written.
    pub async fn settings(&self, user_id: &str) -> Result<Option<Settings>, StorageError> {
        self.read_json(&keys::settings(user_id)).await
    }

    /// When the user's data was last written.
    pub async fn last_sync(&self, user_id: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        let key = keys::last_sync(user_id);
        match self.kv.get(&key).await? {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| StorageError::Corrupt {
                    key,
                    reason: e.to_string(),
                }),
        }
    }

    /// Replace the user's solves and stamp the write.
    pub async fn set_solves(&self, user_id: &str, solves: &[Solve]) -> Result<(), StorageError> {
        let json = serde_json::to_string(solves)?;
        self.kv.set(&keys::solves(user_id), &json).await?;
        self.stamp(user_id).await
    }

    /// Replace the user's settings and stamp the write.
    pub async fn set_settings(&self, user_id: &str, settings: &Settings) -> Result<(), StorageError> {
        let json = serde_json::to_string(settings)?;
        self.kv.set(&keys::settings(user_id), &json).await?;
        self.stamp(user_id).await
    }

    async fn stamp(&self, user_id: &str) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.kv.set(&keys::last_sync(user_id), &now).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.kv.get(key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubetime_types::PuzzleType;

    fn store() -> (Arc<MemoryKv>, UserStore) {
        let kv = Arc::new(MemoryKv::new());
        (kv.clone(), UserStore::new(kv))
    }

    #[test]
    fn key_patterns() {
        assert_eq!(keys::solves("u1"), "user:u1:solves");
        assert_eq!(keys::settings("u1"), "user:u1:settings");
        assert_eq!(keys::last_sync("u1"), "user:u1:lastSync");
    }

    #[tokio::test]
    async fn unwritten_user_reads_empty() {
        let (_, store) = store();
        assert!(store.solves("nobody").await.unwrap().is_empty());
        assert!(store.settings("nobody").await.unwrap().is_none());
        assert!(store.last_sync("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn writes_stamp_last_sync() {
        let (kv, store) = store();
        let solve = Solve::new(12_345.0, "R U R'", PuzzleType::ThreeByThree);
        store.set_solves("alice", &[solve.clone()]).await.unwrap();

        assert_eq!(store.solves("alice").await.unwrap(), vec![solve]);
        let stamp = kv.get("user:alice:lastSync").await.unwrap().unwrap();
        assert!(stamp.ends_with('Z'));
        assert!(store.last_sync("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let (_, store) = store();
        store
            .set_settings("alice", &Settings::default())
            .await
            .unwrap();
        assert!(store.settings("bob").await.unwrap().is_none());
        assert!(store.last_sync("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_value_is_reported() {
        let (kv, store) = store();
        kv.set("user:alice:solves", "not json").await.unwrap();
        assert!(matches!(
            store.solves("alice").await,
            Err(StorageError::Corrupt { .. })
        ));
    }
}
