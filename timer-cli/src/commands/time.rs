//! Time solves from the keyboard.
//!
//! A terminal only reports whole lines, so each Enter stands for a full
//! press-and-hold: the hold is kept past the ready threshold and then
//! released. Enter while the timer runs stops it and saves the solve.

use anyhow::{Context, Result};
use cubetime_client::TimerSession;
use cubetime_core::{
    format_solve_with, format_time_with, Clock, Precision, TimerState, HOLD_THRESHOLD,
};
use cubetime_types::Solve;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::scramble::describe;
use super::{open_session, precision_of};

/// Extra hold time on top of the ready threshold.
const HOLD_MARGIN: Duration = Duration::from_millis(50);

/// Run the time command on stdin.
pub async fn run(data_dir: &Path) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let saved = run_with(data_dir, input).await?;
    println!("Saved {} solves.", saved.len());
    Ok(())
}

/// Drive a session from `input`, one line per press. Returns the saved
/// solves. EOF or `q` ends the session; an attempt still in progress is
/// discarded.
pub async fn run_with<R>(data_dir: &Path, input: R) -> Result<Vec<Solve>>
where
    R: AsyncBufRead + Unpin,
{
    let mut session = open_session(data_dir)?;
    let precision = precision_of(&session.settings().get());
    let mut saved = Vec::new();

    println!("Scramble: {}", describe(session.scramble()));
    println!("Enter to start, Enter to stop, q to quit.");

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.trim().eq_ignore_ascii_case("q") {
            break;
        }

        if session.driver().state() == TimerState::Running {
            if let Some(solve) = session.hold_begin() {
                session.hold_end();
                report(&session, &solve, precision);
                saved.push(solve);
                println!();
                println!("Scramble: {}", describe(session.scramble()));
            }
            continue;
        }

        press(&mut session).await;
        match session.driver().state() {
            TimerState::Inspection => {
                let remaining = session.driver().snapshot().inspection_remaining;
                println!("Inspecting ({} s). Enter to start.", remaining);
            }
            TimerState::Running => println!("Running. Enter to stop."),
            state => tracing::debug!(?state, "press had no effect"),
        }
    }

    if session.driver().state() != TimerState::Idle
        && session.driver().state() != TimerState::Stopped
    {
        println!("Attempt discarded.");
    }
    session.shutdown();
    Ok(saved)
}

/// Hold past the ready threshold, then release.
async fn press<C: Clock + 'static>(session: &mut TimerSession<C>) {
    session.hold_begin();
    tokio::time::sleep(HOLD_THRESHOLD + HOLD_MARGIN).await;
    session.hold_end();
}

fn report<C: Clock + 'static>(session: &TimerSession<C>, solve: &Solve, precision: Precision) {
    let stats = session.statistics();
    println!(
        "Time: {}  (ao5 {}, ao12 {})",
        format_solve_with(solve, precision),
        format_time_with(stats.ao5, precision),
        format_time_with(stats.ao12, precision)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::open_engines;
    use cubetime_client::EngineConfig;
    use cubetime_types::{Penalty, PuzzleType};
    use tempfile::tempdir;

    fn stored(dir: &Path) -> Vec<Solve> {
        open_engines(dir, EngineConfig::default())
            .unwrap()
            .0
            .get()
            .into_vec()
    }

    #[tokio::test]
    async fn two_presses_save_one_solve() {
        let dir = tempdir().unwrap();
        let saved = run_with(dir.path(), &b"\n\n"[..]).await.unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].penalty(), Penalty::None);
        assert_eq!(saved[0].puzzle(), PuzzleType::ThreeByThree);
        assert_eq!(saved[0].scramble.split_whitespace().count(), 20);
        assert_eq!(stored(dir.path()), saved);
    }

    #[tokio::test]
    async fn each_solve_gets_a_fresh_scramble() {
        let dir = tempdir().unwrap();
        let saved = run_with(dir.path(), &b"\n\n\n\n"[..]).await.unwrap();

        assert_eq!(saved.len(), 2);
        assert_ne!(saved[0].scramble, saved[1].scramble);
    }

    #[tokio::test]
    async fn quit_discards_running_attempt() {
        let dir = tempdir().unwrap();
        let saved = run_with(dir.path(), &b"\nq\n\n"[..]).await.unwrap();
        assert!(saved.is_empty());
        assert!(stored(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn inspection_takes_an_extra_press() {
        let dir = tempdir().unwrap();
        let (_, settings) = open_engines(dir.path(), EngineConfig::default()).unwrap();
        settings.update(|s| s.inspection_enabled = true);

        // Inspect, start, stop.
        let saved = run_with(dir.path(), &b"\n\n\n"[..]).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].penalty(), Penalty::None);
    }

    #[tokio::test]
    async fn solve_uses_selected_puzzle() {
        let dir = tempdir().unwrap();
        let (_, settings) = open_engines(dir.path(), EngineConfig::default()).unwrap();
        settings.update(|s| s.cube_type = PuzzleType::Pyraminx);

        let saved = run_with(dir.path(), &b"\n\n"[..]).await.unwrap();
        assert_eq!(saved[0].puzzle(), PuzzleType::Pyraminx);
    }
}
