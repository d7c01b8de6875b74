//! cubetime-server binary entry point.
//!
//! Usage:
//! ```bash
//! cubetime-server --config cubetime-server.toml
//! cubetime-server --help
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use cubetime_server::config::Config;
use cubetime_server::http::build_router;
use cubetime_server::server::SyncServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Reference sync endpoint for the cubetime timer.
#[derive(Parser, Debug)]
#[command(name = "cubetime-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short, default_value = "cubetime-server.toml")]
    config: PathBuf,

    /// Override the bind address from the configuration
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::from_file(&args.config)?
    } else {
        tracing::warn!(path = %args.config.display(), "config file not found, using defaults");
        Config::default()
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if config.auth.tokens.is_empty() {
        tracing::warn!("no tokens configured; every sync request will be rejected");
    }

    let bind_address = config.server.bind_address.clone();
    let server = SyncServer::from_config(config)
        .await
        .context("Failed to open storage")?;
    let app = build_router(Arc::new(server));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, "cubetime-server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
