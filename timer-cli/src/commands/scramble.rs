//! Print scrambles.

use anyhow::Result;
use cubetime_client::{EngineConfig, SyncEngine};
use cubetime_core::{generate_for, Fidelity, PuzzleScramble};
use cubetime_types::{PuzzleType, Settings};
use rand::Rng;
use std::path::Path;

use super::open_engines;

/// Run the scramble command.
///
/// Without `--puzzle` the puzzle selected in the settings is used.
pub async fn run(data_dir: &Path, puzzle: Option<PuzzleType>, count: usize) -> Result<()> {
    let puzzle = match puzzle {
        Some(puzzle) => puzzle,
        None => selected_puzzle(data_dir)?,
    };

    let mut rng = rand::thread_rng();
    for line in scrambles(puzzle, count, &mut rng) {
        println!("{}", line);
    }
    Ok(())
}

fn selected_puzzle(data_dir: &Path) -> Result<PuzzleType> {
    let (_, settings): (_, SyncEngine<Settings>) =
        open_engines(data_dir, EngineConfig::default())?;
    Ok(settings.with(|s| s.cube_type))
}

fn scrambles<R: Rng + ?Sized>(puzzle: PuzzleType, count: usize, rng: &mut R) -> Vec<String> {
    (0..count)
        .map(|i| {
            let scramble = generate_for(puzzle, rng);
            if count > 1 {
                format!("{:>3}. {}", i + 1, describe(&scramble))
            } else {
                describe(&scramble)
            }
        })
        .collect()
}

/// Scramble text, flagged when it is only a placeholder.
pub fn describe(scramble: &PuzzleScramble) -> String {
    match scramble.fidelity {
        Fidelity::Accurate => scramble.text.clone(),
        Fidelity::Approximate => format!("{}  (approximate)", scramble.text),
    }
}
