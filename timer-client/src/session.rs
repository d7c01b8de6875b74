//! Timer session orchestrator.
//!
//! [`TimerSession`] wires the timer driver to the two synced stores. It owns
//! the hold gesture (the 300 ms ready threshold), turns a stopped timer into
//! a persisted solve and keeps the current scramble in step with the
//! selected puzzle.
//!
//! Input mapping, for a host with a single key or touch surface:
//!
//! | Input      | Timer running        | Otherwise                           |
//! |------------|----------------------|-------------------------------------|
//! | press      | stop and save        | arm ready after [`HOLD_THRESHOLD`]  |
//! | release    | -                    | start inspection or timer if ready  |

use std::sync::Arc;

use cubetime_core::{
    calculate_for, generate_for, Clock, PuzzleScramble, SolveStore, Statistics, TimerState,
    TimerStateMachine, HOLD_THRESHOLD,
};
use cubetime_types::{Penalty, PuzzleType, Settings, Solve, SolveId};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::deferred::DeferredTask;
use crate::driver::TimerDriver;
use crate::engine::SyncEngine;
use crate::remote::RemoteStore;

/// One user's timing session: timer, solves, settings and scramble.
pub struct TimerSession<C: Clock + 'static> {
    driver: TimerDriver<C>,
    solves: SyncEngine<SolveStore>,
    settings: SyncEngine<Settings>,
    hold: DeferredTask,
    held: bool,
    scramble: PuzzleScramble,
    rng: StdRng,
}

impl<C: Clock + 'static> TimerSession<C> {
    /// Create a session over already opened stores.
    pub fn new(clock: C, solves: SyncEngine<SolveStore>, settings: SyncEngine<Settings>) -> Self {
        Self::with_rng(clock, solves, settings, StdRng::from_entropy())
    }

    /// Create a session with a caller-provided scramble generator.
    pub fn with_rng(
        clock: C,
        solves: SyncEngine<SolveStore>,
        settings: SyncEngine<Settings>,
        mut rng: StdRng,
    ) -> Self {
        let current = settings.get();
        let machine = TimerStateMachine::with_inspection(
            clock,
            current.inspection_enabled,
            current.inspection_time,
        );
        let scramble = generate_for(current.cube_type, &mut rng);

        Self {
            driver: TimerDriver::new(machine),
            solves,
            settings,
            hold: DeferredTask::new(),
            held: false,
            scramble,
            rng,
        }
    }

    /// The timer driver, for display subscriptions.
    pub fn driver(&self) -> &TimerDriver<C> {
        &self.driver
    }

    /// The solve store.
    pub fn solves(&self) -> &SyncEngine<SolveStore> {
        &self.solves
    }

    /// The settings store.
    pub fn settings(&self) -> &SyncEngine<Settings> {
        &self.settings
    }

    // ===== Input =====

    /// Key or touch pressed.
    ///
    /// Stops and saves a running solve. Otherwise arms the ready threshold;
    /// repeated presses while held (key auto-repeat) are ignored.
    pub fn hold_begin(&mut self) -> Option<Solve> {
        if self.driver.state() == TimerState::Running {
            return self.stop();
        }
        if self.held {
            return None;
        }
        self.held = true;

        if matches!(
            self.driver.state(),
            TimerState::Idle | TimerState::Stopped | TimerState::Inspection
        ) {
            let driver = self.driver.clone();
            self.hold.arm(HOLD_THRESHOLD, move || driver.set_ready());
        }
        None
    }

    /// Key or touch released.
    ///
    /// Releasing before the threshold does nothing. Releasing once ready
    /// starts inspection (if enabled and not yet inspected) or the timer.
    pub fn hold_end(&mut self) {
        self.held = false;
        self.hold.cancel();
        if self.driver.state() == TimerState::Ready {
            self.driver.release();
        }
    }

    /// Stop a running solve and save it. `None` when nothing was running.
    pub fn stop(&mut self) -> Option<Solve> {
        if self.driver.state() != TimerState::Running {
            return None;
        }
        let time = self.driver.stop();
        let penalty = self.driver.pending_penalty();
        Some(self.save(time, penalty))
    }

    /// Abandon the current attempt without saving anything.
    pub fn abort(&mut self) {
        self.held = false;
        self.hold.cancel();
        self.driver.reset();
    }

    fn save(&mut self, time: f64, penalty: Penalty) -> Solve {
        let mut solve = Solve::new(time, self.scramble.text.clone(), self.scramble.puzzle);
        solve.set_penalty(penalty);
        tracing::debug!(id = %solve.id, time, ?penalty, "saving solve");

        let saved = solve.clone();
        self.solves.update(|store| store.push(solve));
        self.new_scramble();
        saved
    }

    // ===== Scramble =====

    /// The scramble for the next solve.
    pub fn scramble(&self) -> &PuzzleScramble {
        &self.scramble
    }

    /// Replace the current scramble with a fresh one.
    pub fn new_scramble(&mut self) -> &PuzzleScramble {
        let puzzle = self.settings.with(|s| s.cube_type);
        self.scramble = generate_for(puzzle, &mut self.rng);
        &self.scramble
    }

    // ===== Solves =====

    /// Flip DNF on a solve. Returns whether the solve existed.
    pub fn toggle_dnf(&self, id: &SolveId) -> bool {
        self.solves.update(|store| store.toggle_dnf(id))
    }

    /// Flip +2 on a solve. Returns whether anything changed.
    pub fn toggle_plus_two(&self, id: &SolveId) -> bool {
        self.solves.update(|store| store.toggle_plus_two(id))
    }

    /// Delete a solve.
    pub fn delete(&self, id: &SolveId) -> Option<Solve> {
        self.solves.update(|store| store.delete(id))
    }

    /// Flip DNF on the most recent solve.
    pub fn toggle_dnf_last(&self) -> bool {
        self.solves.update(SolveStore::toggle_dnf_last)
    }

    /// Flip +2 on the most recent solve.
    pub fn toggle_plus_two_last(&self) -> bool {
        self.solves.update(SolveStore::toggle_plus_two_last)
    }

    /// Delete the most recent solve.
    pub fn delete_last(&self) -> Option<Solve> {
        self.solves.update(SolveStore::delete_last)
    }

    /// Drop every solve.
    pub fn clear_session(&self) {
        self.solves.clear();
    }

    /// Statistics over the solves of the selected puzzle.
    pub fn statistics(&self) -> Statistics {
        let puzzle = self.settings.with(|s| s.cube_type);
        self.solves.with(|store| calculate_for(store.as_slice(), puzzle))
    }

    // ===== Settings =====

    /// Select a puzzle. A new scramble is generated for it.
    pub fn set_puzzle(&mut self, puzzle: PuzzleType) {
        self.settings.update(|s| s.cube_type = puzzle);
        self.new_scramble();
    }

    /// Change the inspection configuration.
    pub fn set_inspection(&self, enabled: bool, secs: u32) {
        self.settings.update(|s| {
            s.inspection_enabled = enabled;
            s.inspection_time = secs;
        });
        self.driver.configure(enabled, secs);
    }

    // ===== Sync lifecycle =====

    /// Attach a remote to both stores and run their initial exchange.
    ///
    /// The exchanges run one after the other: the remote stamp moves on every
    /// push, and the second pull has to see the first push's watermark.
    pub async fn authenticate(&mut self, remote: Arc<dyn RemoteStore>) {
        self.solves.authenticate(Arc::clone(&remote)).await;
        self.settings.authenticate(remote).await;

        // A pulled settings value may carry a different puzzle or inspection setup.
        let current = self.settings.get();
        self.driver
            .configure(current.inspection_enabled, current.inspection_time);
        if current.cube_type != self.scramble.puzzle {
            self.new_scramble();
        }
    }

    /// Detach the remote from both stores.
    pub fn sign_out(&self) {
        self.solves.sign_out();
        self.settings.sign_out();
    }

    /// Report host connectivity.
    pub fn set_online(&self, online: bool) {
        self.solves.set_online(online);
        self.settings.set_online(online);
    }

    /// Report host visibility.
    pub fn set_visible(&self, visible: bool) {
        self.solves.set_visible(visible);
        self.settings.set_visible(visible);
    }

    /// Host is going away: send a last best-effort push of both stores.
    pub fn unload(&self) {
        self.solves.unload();
        self.settings.unload();
    }

    /// Stop all scheduled work. Local data stays.
    pub fn shutdown(&mut self) {
        self.hold.cancel();
        self.driver.reset();
        self.solves.shutdown();
        self.settings.shutdown();
    }
}
