//! Configuration management for the cubetime CLI.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

const REMOTE_FILE: &str = "remote.json";

/// Sync endpoint credentials stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the sync endpoint.
    pub endpoint: String,
    /// Bearer token identifying the user.
    pub token: String,
    /// When the credentials were saved.
    pub saved_at: DateTime<Utc>,
}

impl RemoteConfig {
    /// Create a new remote configuration.
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
            saved_at: Utc::now(),
        }
    }

    /// Load the remote configuration from a directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(REMOTE_FILE);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Not logged in. Run 'cubetime login' first.")?;
        serde_json::from_str(&contents).context("Invalid remote configuration")
    }

    /// Save the remote configuration to a directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(REMOTE_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save remote configuration")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Delete the stored configuration. Returns whether one existed.
    pub async fn remove(data_dir: &Path) -> Result<bool> {
        let path = data_dir.join(REMOTE_FILE);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("Failed to remove remote configuration"),
        }
    }

    /// Check if a remote is configured.
    pub async fn exists(data_dir: &Path) -> bool {
        data_dir.join(REMOTE_FILE).exists()
    }

    /// Token with everything but the first characters masked.
    pub fn masked_token(&self) -> String {
        let visible: String = self.token.chars().take(4).collect();
        format!("{}****", visible)
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Set directory permissions to 0700 (owner only) on Unix.
/// No-op on non-Unix platforms.
pub async fn set_dir_permissions_0700(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .context("Failed to set directory permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn remote_config_roundtrip() {
        let dir = tempdir().unwrap();
        let config = RemoteConfig::new("http://localhost:8787/", "alice-token");
        config.save(dir.path()).await.unwrap();

        let loaded = RemoteConfig::load(dir.path()).await.unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.endpoint, "http://localhost:8787");
    }

    #[tokio::test]
    async fn load_without_login_explains() {
        let dir = tempdir().unwrap();
        let err = RemoteConfig::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("cubetime login"));
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let dir = tempdir().unwrap();
        assert!(!RemoteConfig::remove(dir.path()).await.unwrap());

        RemoteConfig::new("http://x", "t")
            .save(dir.path())
            .await
            .unwrap();
        assert!(RemoteConfig::exists(dir.path()).await);
        assert!(RemoteConfig::remove(dir.path()).await.unwrap());
        assert!(!RemoteConfig::exists(dir.path()).await);
    }

    #[test]
    fn token_is_masked() {
        let config = RemoteConfig::new("http://x", "alice-token");
        assert_eq!(config.masked_token(), "alic****");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn remote_config_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        RemoteConfig::new("http://x", "secret")
            .save(dir.path())
            .await
            .unwrap();

        let path = dir.path().join("remote.json");
        let perms = tokio::fs::metadata(&path).await.unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600, "file should be 0600");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn data_dir_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("test-data");
        tokio::fs::create_dir_all(&data_dir).await.unwrap();
        set_dir_permissions_0700(&data_dir).await.unwrap();

        let perms = tokio::fs::metadata(&data_dir).await.unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o700, "dir should be 0700");
    }
}
