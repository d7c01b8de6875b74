//! Main SyncServer state.
//!
//! SyncServer holds the configuration, the optional user store and the start
//! time, and is shared with every HTTP handler.

use crate::config::{Config, StorageBackend};
use crate::error::StorageError;
use crate::storage::{MemoryKv, SqliteKv, UserStore};
use std::sync::Arc;
use std::time::Instant;

/// Main sync server.
#[derive(Debug)]
pub struct SyncServer {
    config: Config,
    /// `None` when no KV backend is configured.
    store: Option<UserStore>,
    started: Instant,
}

impl SyncServer {
    /// Create a server over an already opened store.
    pub fn new(config: Config, store: Option<UserStore>) -> Self {
        Self {
            config,
            store,
            started: Instant::now(),
        }
    }

    /// Open the configured backend and create the server.
    pub async fn from_config(config: Config) -> Result<Self, StorageError> {
        let store = match config.storage.backend {
            StorageBackend::Sqlite => {
                let kv = SqliteKv::new(&config.storage.database).await?;
                tracing::info!(database = %config.storage.database.display(), "using SQLite storage");
                Some(UserStore::new(Arc::new(kv)))
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage; data is lost on restart");
                Some(UserStore::new(Arc::new(MemoryKv::new())))
            }
            StorageBackend::Disabled => {
                tracing::warn!("KV storage not configured; cloud sync will be disabled");
                None
            }
        };
        Ok(Self::new(config, store))
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The user store, if storage is configured.
    pub fn store(&self) -> Option<&UserStore> {
        self.store.as_ref()
    }

    /// Resolve an `Authorization` header value to a user id.
    pub fn authenticate(&self, authorization: Option<&str>) -> Option<&str> {
        let token = authorization?.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        self.config.user_for_token(token)
    }

    /// Seconds since the server was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_with_token() -> SyncServer {
        let mut config = Config::default();
        config
            .auth
            .tokens
            .insert("s3cret".to_string(), "alice".to_string());
        SyncServer::new(config, None)
    }

    #[test]
    fn bearer_token_resolves_user() {
        let server = server_with_token();
        assert_eq!(server.authenticate(Some("Bearer s3cret")), Some("alice"));
    }

    #[test]
    fn bad_credentials_are_rejected() {
        let server = server_with_token();
        assert_eq!(server.authenticate(None), None);
        assert_eq!(server.authenticate(Some("Bearer wrong")), None);
        assert_eq!(server.authenticate(Some("Basic s3cret")), None);
        assert_eq!(server.authenticate(Some("Bearer ")), None);
    }

    #[tokio::test]
    async fn disabled_backend_has_no_store() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Disabled;
        let server = SyncServer::from_config(config).await.unwrap();
        assert!(server.store().is_none());
    }

    #[tokio::test]
    async fn memory_backend_has_store() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        let server = SyncServer::from_config(config).await.unwrap();
        assert!(server.store().is_some());
    }
}
