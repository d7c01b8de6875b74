//! Runtime for the timer state machine.
//!
//! [`TimerDriver`] owns a [`TimerStateMachine`] behind a mutex, turns its
//! [`TimerAction`]s into real repeating tasks and publishes a
//! [`TimerSnapshot`] after every transition and every tick.
//!
//! Displayed values are always derived from the machine's anchors, so a
//! slow or skipped tick only delays the display, it never skews the time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use cubetime_core::{
    Clock, Ticker, TimerAction, TimerSnapshot, TimerState, TimerStateMachine,
};
use cubetime_types::Penalty;
use tokio::sync::watch;

use crate::deferred::RepeatingTask;

struct DriverInner<C: Clock> {
    machine: Mutex<TimerStateMachine<C>>,
    tickers: Mutex<HashMap<Ticker, RepeatingTask>>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
}

/// Drives a timer state machine on the Tokio runtime.
///
/// Cheap to clone; clones drive the same timer.
pub struct TimerDriver<C: Clock + 'static> {
    inner: Arc<DriverInner<C>>,
}

impl<C: Clock + 'static> Clone for TimerDriver<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock + 'static> TimerDriver<C> {
    /// Wrap a machine.
    pub fn new(machine: TimerStateMachine<C>) -> Self {
        let (snapshot_tx, _) = watch::channel(machine.snapshot());
        Self {
            inner: Arc::new(DriverInner {
                machine: Mutex::new(machine),
                tickers: Mutex::new(HashMap::new()),
                snapshot_tx,
            }),
        }
    }

    fn machine(&self) -> MutexGuard<'_, TimerStateMachine<C>> {
        self.inner.machine.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run a transition, then perform its actions and publish.
    fn transition<R>(
        &self,
        f: impl FnOnce(&mut TimerStateMachine<C>) -> (R, Vec<TimerAction>),
    ) -> R {
        let (result, actions, snapshot) = {
            let mut machine = self.machine();
            let (result, actions) = f(&mut machine);
            (result, actions, machine.snapshot())
        };
        for action in actions {
            self.perform(action);
        }
        self.inner.snapshot_tx.send_replace(snapshot);
        result
    }

    fn perform(&self, action: TimerAction) {
        let mut tickers = self.inner.tickers.lock().unwrap_or_else(|e| e.into_inner());
        match action {
            TimerAction::StartTicker { ticker, interval } => {
                let weak = Arc::downgrade(&self.inner);
                tickers
                    .entry(ticker)
                    .or_default()
                    .start(interval, move || on_tick(&weak, ticker));
            }
            TimerAction::CancelTicker(ticker) => {
                if let Some(mut task) = tickers.remove(&ticker) {
                    task.cancel();
                }
            }
            TimerAction::CancelAll => {
                for (_, mut task) in tickers.drain() {
                    task.cancel();
                }
            }
        }
    }

    /// Hold sustained past the threshold.
    pub fn set_ready(&self) {
        self.transition(|m| ((), m.set_ready()));
    }

    /// Abandon a ready state.
    pub fn cancel_ready(&self) {
        self.transition(|m| ((), m.cancel_ready()));
    }

    /// Input released: start inspection or the timer as appropriate.
    pub fn release(&self) {
        self.transition(|m| ((), m.release()));
    }

    /// Begin the inspection countdown.
    pub fn start_inspection(&self) {
        self.transition(|m| ((), m.start_inspection()));
    }

    /// Start timing.
    pub fn start_timer(&self) {
        self.transition(|m| ((), m.start_timer()));
    }

    /// Stop timing and return the finalized duration in milliseconds.
    pub fn stop(&self) -> f64 {
        self.transition(|m| m.stop_timer())
    }

    /// Force idle and cancel every ticker.
    pub fn reset(&self) {
        self.transition(|m| ((), m.reset()));
    }

    /// Update the inspection configuration.
    pub fn configure(&self, inspection_enabled: bool, inspection_secs: u32) {
        self.transition(|m| {
            m.configure(inspection_enabled, inspection_secs);
            ((), Vec::new())
        });
    }

    /// Current state.
    pub fn state(&self) -> TimerState {
        self.machine().state()
    }

    /// Penalty earned by the last inspection overrun.
    pub fn pending_penalty(&self) -> Penalty {
        self.machine().pending_penalty()
    }

    /// Latest display snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.inner.snapshot_tx.borrow()
    }

    /// Watch display snapshots.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Whether the given ticker is currently scheduled.
    pub fn is_ticking(&self, ticker: Ticker) -> bool {
        self.inner
            .tickers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&ticker)
            .is_some_and(RepeatingTask::is_running)
    }
}

fn on_tick<C: Clock>(weak: &Weak<DriverInner<C>>, ticker: Ticker) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let snapshot = {
        let mut machine = inner.machine.lock().unwrap_or_else(|e| e.into_inner());
        machine.tick(ticker);
        machine.snapshot()
    };
    inner.snapshot_tx.send_replace(snapshot);
}
