//! Sync decision machine for cubetime.
//!
//! This module provides a pure, side-effect-free state machine for keeping
//! one keyed value (the solve list or the settings) consistent with the
//! remote store. It takes events as input and produces a list of actions to
//! execute.
//!
//! The actual I/O (pulling, pushing, writing local storage, arming timers)
//! is performed by cubetime-client, not by this module.
//!
//! Push triggers (debounce expiry, the background interval, the host becoming
//! visible or coming back online, a backoff retry) all funnel into a single
//! "push now" decision. The machine never queues values: a push always sends
//! whatever the store holds at the moment it runs, so intermediate values
//! may never reach the remote store.

use std::time::Duration;

use cubetime_types::{errors, SyncStatus};

use crate::retry::{RetryDecision, RetryPolicy, RetryState};

/// Status error shown while the host reports itself offline.
pub const OFFLINE_MESSAGE: &str = "Offline - data saved locally";

/// Timing configuration for one synced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period after the last local mutation before pushing.
    pub debounce: Duration,
    /// Background re-push period while authenticated.
    pub interval: Duration,
    /// Backoff for failed pushes and pulls.
    pub retry: RetryPolicy,
    /// Background interval, visibility and unload pushes.
    pub auto_sync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(2),
            interval: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            auto_sync: true,
        }
    }
}

/// Outcome of comparing the local and remote copies after a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Remote is strictly newer: replace local wholesale.
    ReplaceLocal {
        /// Remote `lastSync`, becomes the local watermark.
        remote_last_sync: i64,
    },
    /// Remote is absent, undated, equal or older: push local.
    PushLocal,
}

/// Last-writer-wins comparison of sync timestamps (epoch ms).
///
/// A missing local watermark counts as older than any remote timestamp.
/// Equal timestamps push, so a fresh session always re-sends its copy.
pub fn reconcile(
    local_last_sync: Option<i64>,
    remote_last_sync: Option<i64>,
    remote_has_value: bool,
) -> Reconcile {
    match remote_last_sync {
        Some(remote) if remote_has_value && remote > local_last_sync.unwrap_or(0) => {
            Reconcile::ReplaceLocal {
                remote_last_sync: remote,
            }
        }
        _ => Reconcile::PushLocal,
    }
}

/// Classification of a failed pull or push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable or server-side failure. Retried with backoff.
    Transport,
    /// No authenticated identity. Surfaced immediately.
    Unauthenticated,
    /// Remote store not provisioned. Disables remote sync for good.
    NotConfigured,
    /// Payload rejected as malformed. Surfaced immediately.
    Rejected,
}

/// Inputs to the sync machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Local copy loaded.
    Initialized {
        /// Persisted watermark from the previous session.
        watermark: Option<i64>,
    },
    /// Another value on this device was pushed at `watermark`. Raises the
    /// watermark, never lowers it.
    WatermarkAdvanced {
        /// Device-wide watermark in epoch ms.
        watermark: i64,
    },
    /// An authenticated identity became available.
    Authenticated,
    /// The identity went away.
    SignedOut,
    /// Pull answered.
    PullCompleted {
        /// Remote `lastSync` in epoch ms.
        remote_last_sync: Option<i64>,
        /// Whether the remote holds a value for this key.
        remote_has_value: bool,
    },
    /// Pull failed.
    PullFailed {
        /// Failure class.
        kind: FailureKind,
        /// Human-readable message.
        error: String,
    },
    /// The local value changed.
    LocalMutation,
    /// Debounce timer expired.
    DebounceFired,
    /// Background interval elapsed.
    IntervalTick,
    /// Host became visible after being hidden.
    BecameVisible,
    /// Host regained connectivity.
    WentOnline,
    /// Host lost connectivity.
    WentOffline,
    /// A requested push started its network call.
    PushStarted,
    /// Push stored remotely.
    PushSucceeded {
        /// Remote `lastSync` after the write, in epoch ms.
        last_sync: i64,
    },
    /// Push failed.
    PushFailed {
        /// Failure class.
        kind: FailureKind,
        /// Human-readable message.
        error: String,
    },
    /// Backoff timer expired.
    RetryFired,
    /// Host is going away; last chance to send.
    Unload,
    /// Owning lifecycle ended.
    Teardown,
}

/// Actions to be executed by the client runtime.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Fetch the remote copy, then report `PullCompleted` or `PullFailed`.
    Pull,
    /// Send the current local value, then report `PushStarted` followed by
    /// `PushSucceeded` or `PushFailed`.
    Push,
    /// Replace the local value with the pulled remote copy.
    ReplaceLocal,
    /// Arm (or re-arm, superseding) the debounce timer.
    ArmDebounce {
        /// Delay until `DebounceFired`.
        delay: Duration,
    },
    /// Cancel the debounce timer.
    CancelDebounce,
    /// Start the background interval.
    StartInterval {
        /// Period between `IntervalTick`s.
        every: Duration,
    },
    /// Stop the background interval.
    CancelInterval,
    /// Arm the backoff timer.
    ArmRetry {
        /// Delay until `RetryFired`.
        delay: Duration,
        /// 1-based retry number.
        attempt: u32,
    },
    /// Cancel the backoff timer.
    CancelRetry,
    /// Fire-and-forget push of the current value. Cannot be retried.
    SendBeacon,
    /// Persist the watermark (epoch ms) alongside the local value.
    PersistWatermark(i64),
}

/// Sync decision machine for one keyed value. NO I/O.
#[derive(Debug, Clone)]
pub struct SyncMachine {
    config: SyncConfig,
    status: SyncStatus,
    watermark: Option<i64>,
    retry: RetryState,
    authenticated: bool,
    online: bool,
    disabled: bool,
    pulled: bool,
    in_flight: bool,
    push_pending: bool,
    debounce_armed: bool,
    retry_armed: bool,
    interval_running: bool,
}

impl SyncMachine {
    /// Create a machine that is online, signed out and has no watermark.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            status: SyncStatus::default(),
            watermark: None,
            retry: RetryState::new(),
            authenticated: false,
            online: true,
            disabled: false,
            pulled: false,
            in_flight: false,
            push_pending: false,
            debounce_armed: false,
            retry_armed: false,
            interval_running: false,
        }
    }

    /// Status triplet for presentation.
    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Last-sync watermark this device knows about.
    pub fn watermark(&self) -> Option<i64> {
        self.watermark
    }

    /// Whether remote sync was permanently disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether an authenticated identity is present.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the host is online.
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Whether the initial pull for this session has completed.
    pub fn has_pulled(&self) -> bool {
        self.pulled
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.retry.failures()
    }

    fn active(&self) -> bool {
        self.authenticated && !self.disabled
    }

    /// Process an event and return the actions to execute.
    pub fn on_event(&mut self, event: SyncEvent) -> Vec<SyncAction> {
        let mut actions = Vec::new();

        match event {
            SyncEvent::Initialized { watermark } => {
                self.watermark = watermark;
            }

            SyncEvent::WatermarkAdvanced { watermark } => {
                self.watermark = self.watermark.max(Some(watermark));
            }

            SyncEvent::Authenticated => {
                if self.disabled || self.authenticated {
                    return actions;
                }
                self.authenticated = true;
                self.pulled = false;
                if self.config.auto_sync {
                    self.interval_running = true;
                    actions.push(SyncAction::StartInterval {
                        every: self.config.interval,
                    });
                }
                self.request_pull(&mut actions);
            }

            SyncEvent::SignedOut => {
                self.authenticated = false;
                self.pulled = false;
                self.in_flight = false;
                self.push_pending = false;
                self.retry.reset();
                self.cancel_timers(&mut actions);
                self.status.is_syncing = false;
                self.status.error = None;
            }

            SyncEvent::PullCompleted {
                remote_last_sync,
                remote_has_value,
            } => {
                if !self.active() {
                    return actions;
                }
                self.pulled = true;
                self.status.is_syncing = false;
                self.retry.reset();
                self.cancel_retry(&mut actions);

                match reconcile(self.watermark, remote_last_sync, remote_has_value) {
                    Reconcile::ReplaceLocal { remote_last_sync } => {
                        // Local edits made before the pull lose to the newer remote.
                        self.push_pending = false;
                        if self.debounce_armed {
                            self.debounce_armed = false;
                            actions.push(SyncAction::CancelDebounce);
                        }
                        self.watermark = Some(remote_last_sync);
                        self.status.last_sync_time = Some(remote_last_sync);
                        self.status.error = None;
                        actions.push(SyncAction::ReplaceLocal);
                        actions.push(SyncAction::PersistWatermark(remote_last_sync));
                    }
                    Reconcile::PushLocal => {
                        self.push_pending = false;
                        self.request_push(&mut actions);
                    }
                }
            }

            SyncEvent::PullFailed { kind, error } => {
                self.status.is_syncing = false;
                self.handle_failure(kind, error, &mut actions);
            }

            SyncEvent::LocalMutation => {
                if self.active() {
                    self.debounce_armed = true;
                    actions.push(SyncAction::ArmDebounce {
                        delay: self.config.debounce,
                    });
                }
            }

            SyncEvent::DebounceFired => {
                self.debounce_armed = false;
                self.request_push(&mut actions);
            }

            SyncEvent::IntervalTick => {
                if self.interval_running {
                    self.request_push(&mut actions);
                }
            }

            SyncEvent::BecameVisible => {
                if self.config.auto_sync {
                    self.request_push(&mut actions);
                }
            }

            SyncEvent::WentOnline => {
                self.online = true;
                if self.status.error.as_deref() == Some(OFFLINE_MESSAGE) {
                    self.status.error = None;
                }
                if self.pulled {
                    self.request_push(&mut actions);
                } else {
                    self.request_pull(&mut actions);
                }
            }

            SyncEvent::WentOffline => {
                self.online = false;
                self.status.error = Some(OFFLINE_MESSAGE.to_string());
                self.cancel_retry(&mut actions);
            }

            SyncEvent::PushStarted => {
                if self.in_flight {
                    self.status.is_syncing = true;
                    self.status.error = None;
                }
            }

            SyncEvent::PushSucceeded { last_sync } => {
                self.in_flight = false;
                self.retry.reset();
                self.cancel_retry(&mut actions);
                self.watermark = Some(last_sync);
                self.status = SyncStatus {
                    is_syncing: false,
                    last_sync_time: Some(last_sync),
                    error: None,
                };
                actions.push(SyncAction::PersistWatermark(last_sync));

                if std::mem::take(&mut self.push_pending) {
                    self.request_push(&mut actions);
                }
            }

            SyncEvent::PushFailed { kind, error } => {
                self.in_flight = false;
                self.push_pending = false;
                self.status.is_syncing = false;
                self.handle_failure(kind, error, &mut actions);
            }

            SyncEvent::RetryFired => {
                if !self.retry_armed {
                    return actions;
                }
                self.retry_armed = false;
                if self.pulled {
                    self.request_push(&mut actions);
                } else {
                    self.request_pull(&mut actions);
                }
            }

            SyncEvent::Unload => {
                // Before the initial pull the remote copy may be newer.
                if self.active() && self.pulled && self.online && self.config.auto_sync {
                    actions.push(SyncAction::SendBeacon);
                }
            }

            SyncEvent::Teardown => {
                self.authenticated = false;
                self.in_flight = false;
                self.push_pending = false;
                self.cancel_timers(&mut actions);
            }
        }

        actions
    }

    fn request_pull(&mut self, actions: &mut Vec<SyncAction>) {
        if !self.active() {
            return;
        }
        if !self.online {
            self.status.error = Some(OFFLINE_MESSAGE.to_string());
            return;
        }
        self.status.is_syncing = true;
        actions.push(SyncAction::Pull);
    }

    fn request_push(&mut self, actions: &mut Vec<SyncAction>) {
        if !self.active() {
            return;
        }
        if !self.pulled {
            // The initial pull decides whether local is pushed at all.
            return;
        }
        if !self.online {
            self.status.error = Some(OFFLINE_MESSAGE.to_string());
            return;
        }
        if self.in_flight {
            self.push_pending = true;
            return;
        }
        self.cancel_retry(actions);
        self.in_flight = true;
        actions.push(SyncAction::Push);
    }

    fn handle_failure(&mut self, kind: FailureKind, error: String, actions: &mut Vec<SyncAction>) {
        match kind {
            FailureKind::Transport => {
                if !self.online {
                    self.status.error = Some(OFFLINE_MESSAGE.to_string());
                    return;
                }
                if !self.active() {
                    self.status.error = Some(error);
                    return;
                }
                match self.retry.record_failure(&self.config.retry) {
                    RetryDecision::Retry { attempt, delay } => {
                        self.retry_armed = true;
                        actions.push(SyncAction::ArmRetry { delay, attempt });
                    }
                    RetryDecision::GiveUp { .. } => {
                        self.retry.reset();
                        self.status.error = Some(error);
                    }
                }
            }
            FailureKind::Unauthenticated => {
                self.retry.reset();
                self.cancel_retry(actions);
                self.status.error = Some(errors::NOT_AUTHENTICATED.to_string());
            }
            FailureKind::Rejected => {
                self.retry.reset();
                self.cancel_retry(actions);
                self.status.error = Some(error);
            }
            FailureKind::NotConfigured => {
                self.disabled = true;
                self.retry.reset();
                self.cancel_timers(actions);
                self.status.is_syncing = false;
                self.status.error = Some(errors::NOT_CONFIGURED.to_string());
            }
        }
    }

    fn cancel_retry(&mut self, actions: &mut Vec<SyncAction>) {
        if self.retry_armed {
            self.retry_armed = false;
            actions.push(SyncAction::CancelRetry);
        }
    }

    fn cancel_timers(&mut self, actions: &mut Vec<SyncAction>) {
        self.debounce_armed = false;
        self.retry_armed = false;
        self.interval_running = false;
        actions.push(SyncAction::CancelDebounce);
        actions.push(SyncAction::CancelInterval);
        actions.push(SyncAction::CancelRetry);
    }
}

impl Default for SyncMachine {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}
