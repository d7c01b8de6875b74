//! Cloud sync: credentials, one-shot sync and status.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cubetime_client::{EngineConfig, HttpRemote, RemoteStore, SyncEngine, Synced};
use std::path::Path;
use std::sync::Arc;

use super::open_engines;
use crate::config::RemoteConfig;

/// Run the login command. Only stores the credentials; `sync` uses them.
pub async fn login(data_dir: &Path, endpoint: &str, token: &str) -> Result<()> {
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        anyhow::bail!("Endpoint must be an http:// or https:// URL");
    }
    if token.trim().is_empty() {
        anyhow::bail!("Token must not be empty");
    }

    if RemoteConfig::exists(data_dir).await {
        println!("Replacing existing credentials.");
    }
    let config = RemoteConfig::new(endpoint, token);
    config.save(data_dir).await?;
    println!("Saved credentials for {}", config.endpoint);
    println!("Run 'cubetime sync' to synchronize.");
    Ok(())
}

/// Run the logout command. Local solves and settings are kept.
pub async fn logout(data_dir: &Path) -> Result<()> {
    if RemoteConfig::remove(data_dir).await? {
        println!("Logged out. Local data was kept.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

/// Run the sync command.
pub async fn run(data_dir: &Path) -> Result<()> {
    let config = RemoteConfig::load(data_dir).await?;
    let remote: Arc<dyn RemoteStore> = Arc::new(
        HttpRemote::new(&config.endpoint, &config.token).context("Failed to create HTTP client")?,
    );

    // A one-shot process has no interval, visibility or unload pushes.
    let engine_config = EngineConfig::default().with_auto_sync(false);
    let (solves, settings) = open_engines(data_dir, engine_config)?;

    tracing::info!(endpoint = %config.endpoint, "syncing");
    // One after the other so the settings pull sees the solves push.
    solves.authenticate(Arc::clone(&remote)).await;
    settings.authenticate(remote).await;

    let outcomes = [outcome("Solves", &solves), outcome("Settings", &settings)];
    solves.shutdown();
    settings.shutdown();

    let mut failed = Vec::new();
    for (label, result) in outcomes {
        match result {
            Ok(line) => println!("{:<9} {}", format!("{}:", label), line),
            Err(error) => {
                println!("{:<9} FAILED ({})", format!("{}:", label), error);
                failed.push(label);
            }
        }
    }
    if !failed.is_empty() {
        anyhow::bail!("Sync failed for {}", failed.join(", ").to_lowercase());
    }
    Ok(())
}

fn outcome<T: Synced>(
    label: &'static str,
    engine: &SyncEngine<T>,
) -> (&'static str, Result<String, String>) {
    let status = engine.status();
    let result = match (&status.error, engine.failures()) {
        (Some(error), _) => Err(error.clone()),
        (None, n) if n > 0 => Err(format!("{} failed attempts", n)),
        (None, _) => Ok(format!(
            "synced, last sync {}",
            format_last_sync(status.last_sync_time)
        )),
    };
    (label, result)
}

/// Run the status command. Reads local state only.
pub async fn status(data_dir: &Path) -> Result<()> {
    println!("=== cubetime status ===");
    println!();

    let (solves, settings) = open_engines(data_dir, EngineConfig::default())?;
    let settings_value = settings.get();
    println!("Local:");
    println!("  Data:    {}", data_dir.display());
    println!("  Solves:  {}", solves.with(|s| s.len()));
    println!("  Puzzle:  {}", settings_value.cube_type.label());
    println!();

    match RemoteConfig::load(data_dir).await {
        Ok(config) => {
            println!("Sync:");
            println!("  Endpoint:  {}", config.endpoint);
            println!("  Token:     {}", config.masked_token());
            println!("  Saved:     {}", format_timestamp(config.saved_at, Utc::now()));
            println!("  Solves:    last sync {}", format_last_sync(solves.watermark()));
            println!("  Settings:  last sync {}", format_last_sync(settings.watermark()));
        }
        Err(_) => {
            println!("Sync: NOT LOGGED IN");
            println!();
            println!("Run 'cubetime login --endpoint <url> --token <token>' to enable sync.");
        }
    }
    Ok(())
}

/// Describe a sync watermark in epoch milliseconds.
fn format_last_sync(ms: Option<i64>) -> String {
    match ms.and_then(DateTime::<Utc>::from_timestamp_millis) {
        Some(at) => format_timestamp(at, Utc::now()),
        None => "never".to_string(),
    }
}

/// Format a timestamp relative to `now`.
fn format_timestamp(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - at).num_seconds().max(0);

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}
