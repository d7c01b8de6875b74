//! # cubetime
//!
//! Command-line speed-solving timer.
//!
//! ## Commands
//!
//! - `scramble`: Print scrambles for a puzzle
//! - `time`: Time a solve from the keyboard
//! - `list`, `stats`: Show the solve history and statistics
//! - `penalty`, `delete`, `clear`: Edit the solve history
//! - `settings`: Show or change preferences
//! - `login`, `logout`, `sync`, `status`: Cloud sync
//!
//! ## Example
//!
//! ```bash
//! # Time a few solves (Enter to start, Enter to stop)
//! cubetime time
//!
//! # Mark the last solve as +2 and look at the averages
//! cubetime penalty last --plus-two
//! cubetime stats
//!
//! # Sync with a server
//! cubetime login --endpoint http://localhost:8787 --token alice-token
//! cubetime sync
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cubetime_types::{PuzzleType, Theme};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::settings::{PrecisionArg, SettingsChange, StatRow, Toggle};
use commands::{scramble, settings, solves, stats, sync, time};

/// Command-line speed-solving timer.
#[derive(Parser, Debug)]
#[command(name = "cubetime")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for solves, settings and credentials
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print scrambles
    Scramble {
        /// Puzzle to scramble for (defaults to the selected puzzle)
        #[arg(long, short)]
        puzzle: Option<PuzzleType>,

        /// Number of scrambles
        #[arg(long, short, default_value = "1")]
        count: usize,
    },

    /// Time solves: Enter to start, Enter to stop, q to quit
    Time,

    /// List recorded solves, newest last
    List {
        /// Only solves of this puzzle
        #[arg(long, short)]
        puzzle: Option<PuzzleType>,

        /// Show at most this many of the most recent solves
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show statistics
    Stats {
        /// Puzzle to compute for (defaults to the selected puzzle)
        #[arg(long, short)]
        puzzle: Option<PuzzleType>,
    },

    /// Toggle a penalty on a solve
    Penalty {
        /// Solve id, id prefix, or "last"
        target: String,

        /// Toggle DNF
        #[arg(long, conflicts_with = "plus_two")]
        dnf: bool,

        /// Toggle +2
        #[arg(long, conflicts_with = "dnf")]
        plus_two: bool,
    },

    /// Delete a solve
    Delete {
        /// Solve id, id prefix, or "last"
        target: String,
    },

    /// Delete every solve
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show or change settings
    Settings {
        /// Inspection countdown before each solve
        #[arg(long, value_enum)]
        inspection: Option<Toggle>,

        /// Inspection ceiling in seconds
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=60))]
        inspection_time: Option<u32>,

        /// Selected puzzle
        #[arg(long)]
        puzzle: Option<PuzzleType>,

        /// Display precision
        #[arg(long, value_enum)]
        precision: Option<PrecisionArg>,

        /// Color theme (dark, light, auto)
        #[arg(long)]
        theme: Option<Theme>,

        /// Show a statistics row
        #[arg(long, value_enum)]
        show: Vec<StatRow>,

        /// Hide a statistics row
        #[arg(long, value_enum)]
        hide: Vec<StatRow>,
    },

    /// Save sync endpoint credentials
    Login {
        /// Sync endpoint base URL
        #[arg(long)]
        endpoint: String,

        /// Bearer token
        #[arg(long)]
        token: String,
    },

    /// Forget sync credentials (local data stays)
    Logout,

    /// Pull, reconcile and push solves and settings
    Sync,

    /// Show local data and sync state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;
    config::set_dir_permissions_0700(&data_dir).await?;

    match cli.command {
        Commands::Scramble { puzzle, count } => {
            scramble::run(&data_dir, puzzle, count).await?;
        }
        Commands::Time => {
            time::run(&data_dir).await?;
        }
        Commands::List { puzzle, limit } => {
            solves::list(&data_dir, puzzle, limit).await?;
        }
        Commands::Stats { puzzle } => {
            stats::run(&data_dir, puzzle).await?;
        }
        Commands::Penalty {
            target,
            dnf,
            plus_two,
        } => {
            let penalty = if dnf {
                solves::PenaltyArg::Dnf
            } else if plus_two {
                solves::PenaltyArg::PlusTwo
            } else {
                anyhow::bail!("Must specify either --dnf or --plus-two");
            };
            solves::penalty(&data_dir, &target, penalty).await?;
        }
        Commands::Delete { target } => {
            solves::delete(&data_dir, &target).await?;
        }
        Commands::Clear { yes } => {
            solves::clear(&data_dir, yes).await?;
        }
        Commands::Settings {
            inspection,
            inspection_time,
            puzzle,
            precision,
            theme,
            show,
            hide,
        } => {
            let change = SettingsChange {
                inspection,
                inspection_time,
                puzzle,
                precision,
                theme,
                show,
                hide,
            };
            settings::run(&data_dir, change).await?;
        }
        Commands::Login { endpoint, token } => {
            sync::login(&data_dir, &endpoint, &token).await?;
        }
        Commands::Logout => {
            sync::logout(&data_dir).await?;
        }
        Commands::Sync => {
            sync::run(&data_dir).await?;
        }
        Commands::Status => {
            sync::status(&data_dir).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for cubetime.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "cubetime", "cubetime")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
