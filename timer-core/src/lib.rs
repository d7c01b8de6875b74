//! # cubetime-core
//!
//! Pure logic for cubetime (no I/O, instant tests).
//!
//! This crate implements the timer state machine, the statistics engine,
//! scramble generation and the sync decision machine without any network,
//! disk or timer I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async, a manual clock where time matters)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! Scheduling (tickers, debounce, backoff, periodic pushes) and the actual
//! I/O are performed by `cubetime-client`, which interprets the actions
//! produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod retry;
pub mod scramble;
pub mod stats;
pub mod store;
pub mod sync;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use scramble::{
    generate_3x3, generate_for, Axis, Face, Fidelity, Modifier, Move, PuzzleScramble, Scramble,
    ScrambleError, DEFAULT_SCRAMBLE_LENGTH,
};
pub use stats::{
    ao12, ao5, best, calculate, calculate_for, effective_time, format_solve, format_solve_with,
    format_time, format_time_with, mean, trimmed_average, worst, Precision, Statistics,
};
pub use store::SolveStore;
pub use sync::{
    reconcile, FailureKind, Reconcile, SyncAction, SyncConfig, SyncEvent, SyncMachine,
    OFFLINE_MESSAGE,
};
pub use timer::{
    Ticker, TimerAction, TimerSnapshot, TimerState, TimerStateMachine, FRAME_INTERVAL,
    HOLD_THRESHOLD, INSPECTION_INTERVAL,
};
