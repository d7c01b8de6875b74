//! CLI command implementations.

pub mod scramble;
pub mod settings;
pub mod solves;
pub mod stats;
pub mod sync;
pub mod time;

use anyhow::{Context, Result};
use cubetime_client::{EngineConfig, FileStorage, SyncEngine, TimerSession};
use cubetime_core::{MonotonicClock, Precision, SolveStore};
use cubetime_types::{Settings, SolveId};
use std::path::Path;
use std::sync::Arc;

/// Open the solve and settings stores kept in `data_dir`.
pub fn open_engines(
    data_dir: &Path,
    config: EngineConfig,
) -> Result<(SyncEngine<SolveStore>, SyncEngine<Settings>)> {
    let storage = Arc::new(FileStorage::open(data_dir).context("Failed to open data directory")?);
    let solves = SyncEngine::open(storage.clone(), config);
    let settings = SyncEngine::open(storage, config);
    Ok((solves, settings))
}

/// Open a local-only timing session over `data_dir`.
pub fn open_session(data_dir: &Path) -> Result<TimerSession<MonotonicClock>> {
    let (solves, settings) = open_engines(data_dir, EngineConfig::default())?;
    Ok(TimerSession::new(MonotonicClock::new(), solves, settings))
}

/// Display precision chosen in the settings.
pub fn precision_of(settings: &Settings) -> Precision {
    Precision::from_show_milliseconds(settings.show_milliseconds)
}

/// Which solve a command operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The most recent solve.
    Last,
    /// A solve by full id.
    Id(SolveId),
}

/// Resolve `"last"`, a full id or an unambiguous id prefix.
pub fn resolve_target(store: &SolveStore, arg: &str) -> Result<Target> {
    if arg.eq_ignore_ascii_case("last") {
        if store.is_empty() {
            anyhow::bail!("No solves recorded");
        }
        return Ok(Target::Last);
    }

    let mut matches = store.iter().filter(|s| s.id.as_str().starts_with(arg));
    match (matches.next(), matches.next()) {
        (Some(solve), None) => Ok(Target::Id(solve.id.clone())),
        (Some(_), Some(_)) => {
            // A full id can still be a prefix of a longer one.
            let exact = SolveId::from_string(arg);
            if store.get(&exact).is_some() {
                Ok(Target::Id(exact))
            } else {
                anyhow::bail!("Ambiguous solve id '{}'", arg)
            }
        }
        (None, _) => anyhow::bail!("No solve with id '{}'", arg),
    }
}
