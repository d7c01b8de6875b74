//! Timer state machine for cubetime.
//!
//! This module provides a pure, side-effect-free state machine for the
//! hold-to-ready / inspection / run / stop lifecycle. Every transition
//! returns the list of scheduling actions the runtime has to perform
//! (start or cancel a ticker); the machine itself never sleeps or spawns.
//!
//! ```text
//! idle ──set_ready──► ready ──release──► running ──stop──► stopped
//!                       │                   ▲                 │
//!                       └─► inspection ─────┘                 │
//!                           (hold/release → ready → running)  │
//!   ▲                                                          │
//!   └──────────────────────── set_ready ◄──────────────────────┘
//! ```
//!
//! The 300 ms hold debounce is *not* implemented here: the orchestrator
//! delays its call to [`TimerStateMachine::set_ready`] by [`HOLD_THRESHOLD`]
//! and simply never calls it when the hold is released early.

use std::time::Duration;

use cubetime_types::{Penalty, DEFAULT_INSPECTION_SECS};

use crate::clock::Clock;

/// How long input must be held before the timer becomes ready.
pub const HOLD_THRESHOLD: Duration = Duration::from_millis(300);

/// Display refresh interval while running (one animation frame).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Inspection countdown refresh interval.
pub const INSPECTION_INTERVAL: Duration = Duration::from_millis(100);

/// Inspection overrun past which the solve is a DNF instead of a +2.
const INSPECTION_DNF_GRACE_MS: f64 = 2000.0;

/// Lifecycle state of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    /// No measurement in progress.
    #[default]
    Idle,
    /// Hold sustained past the threshold; releasing starts the next phase.
    Ready,
    /// Inspection countdown running.
    Inspection,
    /// Solve being timed.
    Running,
    /// Solve finished; the final time is frozen on display.
    Stopped,
}

/// Periodic callbacks the runtime drives on behalf of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ticker {
    /// Elapsed-time display refresh while running.
    Frame,
    /// Inspection countdown refresh.
    Inspection,
}

/// Scheduling instructions for the runtime.
///
/// These are instructions, not side effects. The timer driver interprets
/// them with real intervals and feeds [`TimerStateMachine::tick`] back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Start calling `tick(ticker)` every `interval` (replacing any running one).
    StartTicker {
        /// Which ticker to start.
        ticker: Ticker,
        /// Tick period.
        interval: Duration,
    },
    /// Stop the given ticker.
    CancelTicker(Ticker),
    /// Stop every ticker.
    CancelAll,
}

/// Point-in-time view of the timer for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSnapshot {
    /// Current state tag.
    pub state: TimerState,
    /// Elapsed milliseconds as last sampled (frozen once stopped).
    pub elapsed_ms: f64,
    /// Whole seconds of inspection left, rounded up.
    pub inspection_remaining: u32,
    /// Penalty earned by overrunning inspection.
    pub pending_penalty: Penalty,
}

/// The timer state machine.
///
/// Owns every timestamp anchor; callers only ever see derived values.
#[derive(Debug)]
pub struct TimerStateMachine<C: Clock> {
    clock: C,
    inspection_enabled: bool,
    inspection_secs: u32,
    state: TimerState,
    run_anchor: Option<f64>,
    inspection_anchor: Option<f64>,
    elapsed_ms: f64,
    final_ms: f64,
    inspection_remaining: u32,
    pending_penalty: Penalty,
}

impl<C: Clock> TimerStateMachine<C> {
    /// Create an idle timer with inspection disabled.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            inspection_enabled: false,
            inspection_secs: DEFAULT_INSPECTION_SECS,
            state: TimerState::Idle,
            run_anchor: None,
            inspection_anchor: None,
            elapsed_ms: 0.0,
            final_ms: 0.0,
            inspection_remaining: DEFAULT_INSPECTION_SECS,
            pending_penalty: Penalty::None,
        }
    }

    /// Create an idle timer with the given inspection configuration.
    pub fn with_inspection(clock: C, enabled: bool, secs: u32) -> Self {
        let mut machine = Self::new(clock);
        machine.configure(enabled, secs);
        machine
    }

    /// Update the inspection configuration.
    ///
    /// The displayed countdown is reset to the new ceiling only when no
    /// cycle is in progress.
    pub fn configure(&mut self, inspection_enabled: bool, inspection_secs: u32) {
        self.inspection_enabled = inspection_enabled;
        self.inspection_secs = inspection_secs;
        if matches!(self.state, TimerState::Idle | TimerState::Stopped) {
            self.inspection_remaining = inspection_secs;
        }
    }

    /// Current state.
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Whether inspection is enabled.
    pub fn inspection_enabled(&self) -> bool {
        self.inspection_enabled
    }

    /// Penalty earned by the last inspection overrun, if any.
    pub fn pending_penalty(&self) -> Penalty {
        self.pending_penalty
    }

    /// Last finalized duration (0 before the first stop or after a reset).
    pub fn last_time(&self) -> f64 {
        self.final_ms
    }

    /// Display snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            elapsed_ms: self.elapsed_ms,
            inspection_remaining: self.inspection_remaining,
            pending_penalty: self.pending_penalty,
        }
    }

    /// Hold sustained past the threshold.
    ///
    /// Valid from idle, stopped and inspection. During inspection the
    /// countdown keeps running while ready.
    pub fn set_ready(&mut self) -> Vec<TimerAction> {
        match self.state {
            TimerState::Idle | TimerState::Stopped => {
                self.pending_penalty = Penalty::None;
                self.state = TimerState::Ready;
            }
            TimerState::Inspection => self.state = TimerState::Ready,
            TimerState::Ready | TimerState::Running => {}
        }
        Vec::new()
    }

    /// Abandon a ready state without starting anything.
    ///
    /// Returns to inspection if the countdown was in progress, else idle.
    pub fn cancel_ready(&mut self) -> Vec<TimerAction> {
        if self.state == TimerState::Ready {
            self.state = if self.inspection_anchor.is_some() {
                TimerState::Inspection
            } else {
                TimerState::Idle
            };
        }
        Vec::new()
    }

    /// Input released.
    ///
    /// From ready: starts inspection when enabled and not yet inspected,
    /// otherwise starts the timer. A no-op in every other state.
    pub fn release(&mut self) -> Vec<TimerAction> {
        if self.state != TimerState::Ready {
            return Vec::new();
        }
        if self.inspection_anchor.is_none() && self.inspection_enabled {
            self.start_inspection()
        } else {
            self.start_timer()
        }
    }

    /// Begin the inspection countdown.
    ///
    /// No-op unless ready, inspection is enabled, and this cycle has not
    /// already been inspected.
    pub fn start_inspection(&mut self) -> Vec<TimerAction> {
        if self.state != TimerState::Ready
            || !self.inspection_enabled
            || self.inspection_anchor.is_some()
        {
            return Vec::new();
        }

        self.inspection_anchor = Some(self.clock.now_ms());
        self.inspection_remaining = self.inspection_secs;
        self.state = TimerState::Inspection;
        vec![TimerAction::StartTicker {
            ticker: Ticker::Inspection,
            interval: INSPECTION_INTERVAL,
        }]
    }

    /// Start timing. Valid from ready or inspection; otherwise a no-op.
    pub fn start_timer(&mut self) -> Vec<TimerAction> {
        if !matches!(self.state, TimerState::Ready | TimerState::Inspection) {
            return Vec::new();
        }

        let now = self.clock.now_ms();
        let mut actions = Vec::new();

        if let Some(anchor) = self.inspection_anchor.take() {
            self.pending_penalty = self.overrun_penalty(now - anchor);
            actions.push(TimerAction::CancelTicker(Ticker::Inspection));
        }

        self.elapsed_ms = 0.0;
        self.run_anchor = Some(now);
        self.state = TimerState::Running;
        actions.push(TimerAction::StartTicker {
            ticker: Ticker::Frame,
            interval: FRAME_INTERVAL,
        });
        actions
    }

    /// Stop timing and return the authoritative finalized duration.
    ///
    /// When not running this returns the last finalized value without
    /// changing state, so duplicate stop signals are harmless.
    pub fn stop_timer(&mut self) -> (f64, Vec<TimerAction>) {
        let anchor = match (self.state, self.run_anchor) {
            (TimerState::Running, Some(anchor)) => anchor,
            _ => return (self.final_ms, Vec::new()),
        };

        let final_ms = (self.clock.now_ms() - anchor).max(0.0);
        self.final_ms = final_ms;
        self.elapsed_ms = final_ms;
        self.run_anchor = None;
        self.state = TimerState::Stopped;
        (final_ms, vec![TimerAction::CancelTicker(Ticker::Frame)])
    }

    /// Force idle from any state, clearing every anchor. Idempotent.
    pub fn reset(&mut self) -> Vec<TimerAction> {
        self.state = TimerState::Idle;
        self.run_anchor = None;
        self.inspection_anchor = None;
        self.elapsed_ms = 0.0;
        self.final_ms = 0.0;
        self.inspection_remaining = self.inspection_secs;
        self.pending_penalty = Penalty::None;
        vec![TimerAction::CancelAll]
    }

    /// Refresh derived display values. Called by the runtime per ticker.
    ///
    /// Values are derived from the anchors and the clock, never from the
    /// number of ticks, so late or dropped ticks cannot cause drift.
    pub fn tick(&mut self, ticker: Ticker) {
        let now = self.clock.now_ms();
        match ticker {
            Ticker::Frame => {
                if let (TimerState::Running, Some(anchor)) = (self.state, self.run_anchor) {
                    self.elapsed_ms = (now - anchor).max(0.0);
                }
            }
            Ticker::Inspection => {
                if let Some(anchor) = self.inspection_anchor {
                    self.inspection_remaining = self.remaining_secs(now - anchor);
                }
            }
        }
    }

    fn ceiling_ms(&self) -> f64 {
        f64::from(self.inspection_secs) * 1000.0
    }

    fn remaining_secs(&self, inspected_ms: f64) -> u32 {
        let remaining = (self.ceiling_ms() - inspected_ms).max(0.0);
        (remaining / 1000.0).ceil() as u32
    }

    fn overrun_penalty(&self, inspected_ms: f64) -> Penalty {
        let ceiling = self.ceiling_ms();
        if inspected_ms > ceiling + INSPECTION_DNF_GRACE_MS {
            Penalty::Dnf
        } else if inspected_ms > ceiling {
            Penalty::PlusTwo
        } else {
            Penalty::None
        }
    }
}
