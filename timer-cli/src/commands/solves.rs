//! List and edit the solve history.

use anyhow::Result;
use cubetime_core::{format_solve_with, Precision};
use cubetime_types::{PuzzleType, Solve};
use std::path::Path;

use super::{open_session, precision_of, resolve_target, Target};

/// Penalty to toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyArg {
    /// Did Not Finish
    Dnf,
    /// Two-second penalty
    PlusTwo,
}

/// Run the list command.
pub async fn list(data_dir: &Path, puzzle: Option<PuzzleType>, limit: Option<usize>) -> Result<()> {
    let session = open_session(data_dir)?;
    let precision = precision_of(&session.settings().get());
    let solves = match puzzle {
        Some(puzzle) => session.solves().with(|s| s.filtered(puzzle)),
        None => session.solves().with(|s| s.as_slice().to_vec()),
    };

    if solves.is_empty() {
        println!("No solves recorded.");
        return Ok(());
    }

    for line in render_list(&solves, limit, precision) {
        println!("{}", line);
    }
    Ok(())
}

fn render_list(solves: &[Solve], limit: Option<usize>, precision: Precision) -> Vec<String> {
    let skip = limit.map_or(0, |n| solves.len().saturating_sub(n));
    solves
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, solve)| render_row(i + 1, solve, precision))
        .collect()
}

fn render_row(number: usize, solve: &Solve, precision: Precision) -> String {
    let date = match solve.date.parsed() {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => solve.date.to_string(),
    };
    format!(
        "{:>4}  {}  {:>9}  {:<8}  {}  {}",
        number,
        solve.id.short(),
        format_solve_with(solve, precision),
        solve.puzzle().tag(),
        date,
        solve.scramble
    )
}

/// Run the penalty command.
pub async fn penalty(data_dir: &Path, target: &str, penalty: PenaltyArg) -> Result<()> {
    let session = open_session(data_dir)?;
    let target = session
        .solves()
        .with(|store| resolve_target(store, target))?;

    let changed = match (&target, penalty) {
        (Target::Last, PenaltyArg::Dnf) => session.toggle_dnf_last(),
        (Target::Last, PenaltyArg::PlusTwo) => session.toggle_plus_two_last(),
        (Target::Id(id), PenaltyArg::Dnf) => session.toggle_dnf(id),
        (Target::Id(id), PenaltyArg::PlusTwo) => session.toggle_plus_two(id),
    };
    if !changed {
        anyhow::bail!("A DNF solve cannot take +2; remove the DNF first");
    }

    let precision = precision_of(&session.settings().get());
    let solve = session.solves().with(|store| match &target {
        Target::Last => store.last().cloned(),
        Target::Id(id) => store.get(id).cloned(),
    });
    if let Some(solve) = solve {
        println!("{}  {}", solve.id.short(), format_solve_with(&solve, precision));
    }
    Ok(())
}

/// Run the delete command.
pub async fn delete(data_dir: &Path, target: &str) -> Result<()> {
    let session = open_session(data_dir)?;
    let target = session
        .solves()
        .with(|store| resolve_target(store, target))?;

    let removed = match target {
        Target::Last => session.delete_last(),
        Target::Id(id) => session.delete(&id),
    };
    match removed {
        Some(solve) => println!("Deleted {}", solve.id.short()),
        None => anyhow::bail!("Solve not found"),
    }
    Ok(())
}

/// Run the clear command.
pub async fn clear(data_dir: &Path, confirmed: bool) -> Result<()> {
    if !confirmed {
        anyhow::bail!("Refusing to delete every solve without --yes");
    }
    let session = open_session(data_dir)?;
    let count = session.solves().with(|s| s.len());
    session.clear_session();
    println!("Deleted {} solves.", count);
    Ok(())
}
