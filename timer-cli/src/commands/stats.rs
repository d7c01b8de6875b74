//! Show statistics.

use anyhow::Result;
use cubetime_client::EngineConfig;
use cubetime_core::{calculate_for, format_time_with, Precision, Statistics};
use cubetime_types::{PuzzleType, Settings};
use std::path::Path;

use super::{open_engines, precision_of};

/// Run the stats command.
pub async fn run(data_dir: &Path, puzzle: Option<PuzzleType>) -> Result<()> {
    let (solves, settings) = open_engines(data_dir, EngineConfig::default())?;
    let settings = settings.get();
    let puzzle = puzzle.unwrap_or(settings.cube_type);

    let stats = solves.with(|store| calculate_for(store.as_slice(), puzzle));
    for line in render(puzzle, &stats, &settings) {
        println!("{}", line);
    }
    Ok(())
}

fn render(puzzle: PuzzleType, stats: &Statistics, settings: &Settings) -> Vec<String> {
    let precision: Precision = precision_of(settings);
    let mut lines = vec![format!("{} ({} solves)", puzzle.label(), stats.count)];
    for (label, value) in stats.visible(&settings.visible_stats) {
        lines.push(format!("  {:<6} {}", label, format_time_with(value, precision)));
    }
    lines
}
