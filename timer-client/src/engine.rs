//! SyncEngine - offline-first storage for one synced value.
//!
//! This module provides [`SyncEngine`], the store that owns a keyed value
//! (the solve list or the settings), writes it through to local storage on
//! every mutation and keeps it eventually consistent with a remote store.
//!
//! # Architecture
//!
//! SyncEngine uses a pure state machine (from cubetime-core) for the sync
//! decisions and interprets the actions to perform the actual I/O and
//! scheduling.
//!
//! ```text
//! Application → SyncEngine → LocalStorage (synchronous write-through)
//!                   │
//!                   ├──────→ RemoteStore (pull / push / beacon)
//!                   ↓
//!          cubetime-core::SyncMachine (pure decisions)
//! ```
//!
//! Local reads and writes never wait on the network. Status changes are
//! published on a `watch` channel; [`SyncStatus`] is the whole outward
//! contract.
//!
//! # Example
//!
//! ```ignore
//! let storage = Arc::new(FileStorage::open(dir)?);
//! let solves: SyncEngine<SolveStore> = SyncEngine::open(storage, EngineConfig::default());
//!
//! solves.update(|s| s.push(solve));          // local write + debounced push
//! solves.authenticate(Arc::new(remote)).await; // pull, reconcile, push
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use cubetime_core::{
    RetryPolicy, SolveStore, SyncAction, SyncConfig, SyncEvent, SyncMachine,
};
use cubetime_types::{PullResponse, PushRequest, Settings, SyncStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::deferred::{DeferredTask, RepeatingTask};
use crate::remote::RemoteStore;
use crate::storage::{load_or_default, LocalStorage, StorageError};

/// Storage key for the solve list.
pub const SOLVES_KEY: &str = "cube-timer-solves";

/// Storage key for the settings.
pub const SETTINGS_KEY: &str = "cube-timer-settings";

/// Storage key for the newest `lastSync` any push from this device received.
///
/// The remote keeps one stamp per user that every write moves, so a push of
/// one value also advances the point the other values are compared against.
pub const DEVICE_WATERMARK_KEY: &str = "cube-timer-last-sync";

/// Serializes read-modify-write of the device watermark across engines.
static DEVICE_WATERMARK: Mutex<()> = Mutex::new(());

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Local storage failure.
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),

    /// Value could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A value that can be kept in sync.
pub trait Synced:
    Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Local storage key and remote field discriminator.
    const STORAGE_KEY: &'static str;

    /// Push request carrying this value.
    fn to_push(&self) -> PushRequest;

    /// This value's field of a pull, or `None` when the remote has none.
    fn from_pull(response: &PullResponse) -> Option<Self>;
}

impl Synced for SolveStore {
    const STORAGE_KEY: &'static str = SOLVES_KEY;

    fn to_push(&self) -> PushRequest {
        PushRequest::solves(self.as_slice().to_vec())
    }

    fn from_pull(response: &PullResponse) -> Option<Self> {
        // The endpoint always answers with an array; only a stamped remote
        // has ever been written.
        response
            .last_sync
            .map(|_| SolveStore::from_solves(response.solves.clone()))
    }
}

impl Synced for Settings {
    const STORAGE_KEY: &'static str = SETTINGS_KEY;

    fn to_push(&self) -> PushRequest {
        PushRequest::settings(self.clone())
    }

    fn from_pull(response: &PullResponse) -> Option<Self> {
        response.settings.clone()
    }
}

/// Configuration for SyncEngine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Timing and retry parameters handed to the sync machine.
    pub sync: SyncConfig,
}

impl EngineConfig {
    /// Set the mutation debounce.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.sync.debounce = debounce;
        self
    }

    /// Set the background push interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.sync.interval = interval;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.sync.retry = retry;
        self
    }

    /// Enable or disable interval, visibility and unload pushes.
    pub fn with_auto_sync(mut self, auto_sync: bool) -> Self {
        self.sync.auto_sync = auto_sync;
        self
    }
}

#[derive(Default)]
struct Timers {
    debounce: DeferredTask,
    retry: DeferredTask,
    interval: RepeatingTask,
}

struct Inner<T: Synced> {
    value: Mutex<T>,
    machine: Mutex<SyncMachine>,
    storage: Arc<dyn LocalStorage>,
    remote: Mutex<Option<Arc<dyn RemoteStore>>>,
    pulled: Mutex<Option<T>>,
    timers: Mutex<Timers>,
    visible: Mutex<bool>,
    status_tx: watch::Sender<SyncStatus>,
}

/// Offline-first store for one synced value.
///
/// Cheap to clone; clones share the same value and schedule.
pub struct SyncEngine<T: Synced> {
    inner: Arc<Inner<T>>,
}

impl<T: Synced> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn watermark_key(key: &str) -> String {
    format!("{}-last-sync", key)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl<T: Synced> SyncEngine<T> {
    /// Load the local copy (or the default) and create a signed-out engine.
    ///
    /// Never fails: missing or corrupt entries fall back to defaults.
    pub fn open(storage: Arc<dyn LocalStorage>, config: EngineConfig) -> Self {
        let value: T = load_or_default(storage.as_ref(), T::STORAGE_KEY);
        let watermark = read_watermark(storage.as_ref(), &watermark_key(T::STORAGE_KEY))
            .max(read_watermark(storage.as_ref(), DEVICE_WATERMARK_KEY));

        let mut machine = SyncMachine::new(config.sync);
        machine.on_event(SyncEvent::Initialized { watermark });

        let (status_tx, _) = watch::channel(machine.status().clone());
        tracing::debug!(key = T::STORAGE_KEY, ?watermark, "opened local copy");

        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(value),
                machine: Mutex::new(machine),
                storage,
                remote: Mutex::new(None),
                pulled: Mutex::new(None),
                timers: Mutex::new(Timers::default()),
                visible: Mutex::new(true),
                status_tx,
            }),
        }
    }

    fn from_weak(weak: &Weak<Inner<T>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn downgrade(&self) -> Weak<Inner<T>> {
        Arc::downgrade(&self.inner)
    }

    // ===== Local access =====

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        lock(&self.inner.value).clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&lock(&self.inner.value))
    }

    /// Derive the next value from the current one, write it through to
    /// local storage and schedule a debounced push.
    ///
    /// This is the single mutation entry point; concurrent callers are
    /// serialized. Must not call back into this engine from `f`.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = lock(&self.inner.value);
            let result = f(&mut value);
            self.write_local(&value);
            result
        };
        self.fire(SyncEvent::LocalMutation);
        result
    }

    /// Replace the whole value.
    pub fn replace(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Reset to the default value, drop the local entry and schedule a
    /// push of the empty value.
    pub fn clear(&self) {
        {
            let mut value = lock(&self.inner.value);
            *value = T::default();
            if let Err(e) = self.inner.storage.remove(T::STORAGE_KEY) {
                tracing::warn!(key = T::STORAGE_KEY, error = %e, "failed to remove local entry");
            }
        }
        self.fire(SyncEvent::LocalMutation);
    }

    /// Write the current value to local storage, reporting failures.
    pub fn persist(&self) -> Result<(), EngineError> {
        let json = serde_json::to_string(&*lock(&self.inner.value))?;
        self.inner.storage.set(T::STORAGE_KEY, &json)?;
        Ok(())
    }

    fn write_local(&self, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(EngineError::from)
            .and_then(|json| Ok(self.inner.storage.set(T::STORAGE_KEY, &json)?));
        if let Err(e) = result {
            tracing::warn!(key = T::STORAGE_KEY, error = %e, "local write failed");
        }
    }

    // ===== Session and host signals =====

    /// Attach an authenticated remote, then pull, reconcile and push.
    ///
    /// Resolves once the initial exchange (including any retries that are
    /// not deferred) has finished; the outcome is visible in [`status`].
    ///
    /// [`status`]: Self::status
    pub async fn authenticate(&self, remote: Arc<dyn RemoteStore>) {
        *lock(&self.inner.remote) = Some(remote);
        self.dispatch(SyncEvent::Authenticated).await;
    }

    /// Detach the remote and stop all remote activity. Local data stays.
    pub fn sign_out(&self) {
        self.fire(SyncEvent::SignedOut);
        *lock(&self.inner.remote) = None;
        *lock(&self.inner.pulled) = None;
    }

    /// Report host connectivity.
    pub fn set_online(&self, online: bool) {
        let event = if online {
            SyncEvent::WentOnline
        } else {
            SyncEvent::WentOffline
        };
        self.fire(event);
    }

    /// Report host visibility. Becoming visible after being hidden pushes.
    pub fn set_visible(&self, visible: bool) {
        let was_visible = std::mem::replace(&mut *lock(&self.inner.visible), visible);
        if visible && !was_visible {
            self.fire(SyncEvent::BecameVisible);
        }
    }

    /// Best-effort, non-blocking push of the current value. Not retried.
    pub fn unload(&self) {
        self.fire(SyncEvent::Unload);
    }

    /// Cancel every scheduled callback. The engine stays usable locally.
    pub fn shutdown(&self) {
        self.fire(SyncEvent::Teardown);
        let mut timers = lock(&self.inner.timers);
        timers.debounce.cancel();
        timers.retry.cancel();
        timers.interval.cancel();
    }

    // ===== Status =====

    /// Current status triplet.
    pub fn status(&self) -> SyncStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Last-sync watermark this device knows about (epoch ms).
    pub fn watermark(&self) -> Option<i64> {
        lock(&self.inner.machine).watermark()
    }

    /// Whether an authenticated remote is attached.
    pub fn is_authenticated(&self) -> bool {
        lock(&self.inner.machine).is_authenticated()
    }

    /// Consecutive failed attempts with a retry still pending.
    pub fn failures(&self) -> u32 {
        lock(&self.inner.machine).failures()
    }

    // ===== Action interpretation =====

    /// Feed one event to the machine and publish the resulting status.
    fn apply(&self, event: SyncEvent) -> Vec<SyncAction> {
        let (actions, status) = {
            let mut machine = lock(&self.inner.machine);
            let actions = machine.on_event(event);
            (actions, machine.status().clone())
        };
        self.inner.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        actions
    }

    /// Handle an event from synchronous code.
    ///
    /// Local actions run inline. If the machine asks for network I/O the
    /// remaining actions continue on a spawned task.
    fn fire(&self, event: SyncEvent) {
        let mut actions: VecDeque<SyncAction> = self.apply(event).into();
        while let Some(action) = actions.pop_front() {
            if matches!(action, SyncAction::Pull | SyncAction::Push) {
                actions.push_front(action);
                let engine = self.clone();
                tokio::spawn(async move { engine.execute(actions).await });
                return;
            }
            self.perform_local(action);
        }
    }

    /// Handle an event and everything that follows from it.
    async fn dispatch(&self, event: SyncEvent) {
        let actions = self.apply(event);
        self.execute(actions.into()).await;
    }

    async fn execute(&self, mut actions: VecDeque<SyncAction>) {
        while let Some(action) = actions.pop_front() {
            let follow_up = match action {
                SyncAction::Pull => Some(self.pull().await),
                SyncAction::Push => self.push().await,
                other => {
                    self.perform_local(other);
                    None
                }
            };
            for event in follow_up.into_iter().flatten() {
                actions.extend(self.apply(event));
            }
        }
    }

    fn remote(&self) -> Option<Arc<dyn RemoteStore>> {
        lock(&self.inner.remote).clone()
    }

    async fn pull(&self) -> Vec<SyncEvent> {
        let Some(remote) = self.remote() else {
            return Vec::new();
        };

        match remote.pull().await {
            Ok(response) => {
                let remote_value = T::from_pull(&response);
                let event = SyncEvent::PullCompleted {
                    remote_last_sync: response.last_sync_ms(),
                    remote_has_value: remote_value.is_some(),
                };
                *lock(&self.inner.pulled) = remote_value;
                tracing::debug!(key = T::STORAGE_KEY, ?event, "pulled");

                // Pushes of the other values since this engine opened.
                let device = read_watermark(self.inner.storage.as_ref(), DEVICE_WATERMARK_KEY);
                device
                    .map(|watermark| SyncEvent::WatermarkAdvanced { watermark })
                    .into_iter()
                    .chain([event])
                    .collect()
            }
            Err(e) => {
                tracing::warn!(key = T::STORAGE_KEY, error = %e, "pull failed");
                vec![SyncEvent::PullFailed {
                    kind: e.kind(),
                    error: e.to_string(),
                }]
            }
        }
    }

    async fn push(&self) -> Option<Vec<SyncEvent>> {
        let remote = self.remote()?;
        let request = self.with(T::to_push);

        // Published before the network call so observers see the flag.
        let started = self.apply(SyncEvent::PushStarted);
        debug_assert!(started.is_empty());

        let event = match remote.push(request).await {
            Ok(response) => {
                let last_sync = response.last_sync_ms().unwrap_or_else(now_ms);
                tracing::debug!(key = T::STORAGE_KEY, last_sync, "pushed");
                advance_device_watermark(self.inner.storage.as_ref(), last_sync);
                SyncEvent::PushSucceeded { last_sync }
            }
            Err(e) => {
                tracing::warn!(key = T::STORAGE_KEY, error = %e, "push failed");
                SyncEvent::PushFailed {
                    kind: e.kind(),
                    error: e.to_string(),
                }
            }
        };
        Some(vec![event])
    }

    fn perform_local(&self, action: SyncAction) {
        match action {
            SyncAction::Pull | SyncAction::Push => {}

            SyncAction::ReplaceLocal => {
                if let Some(remote_value) = lock(&self.inner.pulled).take() {
                    let mut value = lock(&self.inner.value);
                    *value = remote_value;
                    self.write_local(&value);
                    tracing::info!(key = T::STORAGE_KEY, "replaced local copy with newer remote");
                }
            }

            SyncAction::ArmDebounce { delay } => {
                let weak = self.downgrade();
                lock(&self.inner.timers).debounce.arm(delay, move || {
                    spawn_dispatch(&weak, SyncEvent::DebounceFired);
                });
            }
            SyncAction::CancelDebounce => lock(&self.inner.timers).debounce.cancel(),

            SyncAction::StartInterval { every } => {
                let weak = self.downgrade();
                lock(&self.inner.timers).interval.start(every, move || {
                    spawn_dispatch(&weak, SyncEvent::IntervalTick);
                });
            }
            SyncAction::CancelInterval => lock(&self.inner.timers).interval.cancel(),

            SyncAction::ArmRetry { delay, attempt } => {
                tracing::info!(key = T::STORAGE_KEY, attempt, ?delay, "scheduling retry");
                let weak = self.downgrade();
                lock(&self.inner.timers).retry.arm(delay, move || {
                    spawn_dispatch(&weak, SyncEvent::RetryFired);
                });
            }
            SyncAction::CancelRetry => lock(&self.inner.timers).retry.cancel(),

            SyncAction::SendBeacon => {
                if let Some(remote) = self.remote() {
                    let request = self.with(T::to_push);
                    tokio::spawn(async move {
                        if let Err(e) = remote.push(request).await {
                            tracing::debug!(error = %e, "unload push failed");
                        }
                    });
                }
            }

            SyncAction::PersistWatermark(last_sync) => {
                let key = watermark_key(T::STORAGE_KEY);
                if let Err(e) = self.inner.storage.set(&key, &last_sync.to_string()) {
                    tracing::warn!(key, error = %e, "failed to persist watermark");
                }
            }
        }
    }
}

fn spawn_dispatch<T: Synced>(weak: &Weak<Inner<T>>, event: SyncEvent) {
    if let Some(engine) = SyncEngine::from_weak(weak) {
        tokio::spawn(async move { engine.dispatch(event).await });
    }
}

fn read_watermark(storage: &dyn LocalStorage, key: &str) -> Option<i64> {
    match storage.get(key) {
        Ok(Some(raw)) => raw.trim().parse().ok(),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read watermark");
            None
        }
    }
}

fn advance_device_watermark(storage: &dyn LocalStorage, last_sync: i64) {
    let _guard = lock(&DEVICE_WATERMARK);
    if read_watermark(storage, DEVICE_WATERMARK_KEY) >= Some(last_sync) {
        return;
    }
    if let Err(e) = storage.set(DEVICE_WATERMARK_KEY, &last_sync.to_string()) {
        tracing::warn!(error = %e, "failed to persist device watermark");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MockRemote, RemoteError};
    use crate::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};
    use cubetime_core::OFFLINE_MESSAGE;
    use cubetime_types::{PuzzleType, Solve};

    fn solve(time: f64) -> Solve {
        Solve::new(time, "R U R' U'", PuzzleType::ThreeByThree)
    }

    fn open_solves(storage: &MemoryStorage) -> SyncEngine<SolveStore> {
        SyncEngine::open(Arc::new(storage.clone()), EngineConfig::default())
    }

    fn stamp(ms: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    /// Engine authenticated against an empty remote, initial push done.
    async fn synced() -> (MemoryStorage, MockRemote, SyncEngine<SolveStore>) {
        let storage = MemoryStorage::new();
        let remote = MockRemote::new();
        let engine = open_solves(&storage);
        engine.authenticate(Arc::new(remote.clone())).await;
        (storage, remote, engine)
    }

    async fn settle(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    // ===== Local Tests =====

    #[tokio::test]
    async fn open_without_entry_is_default() {
        let engine = open_solves(&MemoryStorage::new());
        assert!(engine.get().is_empty());
        assert_eq!(engine.status(), SyncStatus::default());
    }

    #[tokio::test]
    async fn corrupt_entry_falls_back_to_default() {
        let storage = MemoryStorage::new();
        storage.set(SOLVES_KEY, "[{\"broken\":").unwrap();
        let engine = open_solves(&storage);
        assert!(engine.get().is_empty());
    }

    #[tokio::test]
    async fn update_writes_through_synchronously() {
        let storage = MemoryStorage::new();
        let engine = open_solves(&storage);
        engine.update(|s| s.push(solve(9_000.0)));

        let raw = storage.get(SOLVES_KEY).unwrap().unwrap();
        let stored: SolveStore = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(engine.with(|s| s.len()), 1);

        let reopened = open_solves(&storage);
        assert_eq!(reopened.get(), engine.get());
    }

    #[tokio::test]
    async fn clear_removes_local_entry() {
        let storage = MemoryStorage::new();
        let engine = open_solves(&storage);
        engine.update(|s| s.push(solve(1.0)));
        engine.clear();
        assert!(engine.get().is_empty());
        assert_eq!(storage.get(SOLVES_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn settings_engine_uses_its_own_key() {
        let storage = MemoryStorage::new();
        let engine: SyncEngine<Settings> =
            SyncEngine::open(Arc::new(storage.clone()), EngineConfig::default());
        engine.update(|s| s.inspection_enabled = true);
        assert!(storage.get(SETTINGS_KEY).unwrap().is_some());
        assert!(storage.get(SOLVES_KEY).unwrap().is_none());
    }

    // ===== Reconcile Tests =====

    #[tokio::test(start_paused = true)]
    async fn first_sync_migrates_local_data() {
        let storage = MemoryStorage::new();
        let engine = open_solves(&storage);
        engine.update(|s| s.push(solve(12_000.0)));

        let remote = MockRemote::new();
        engine.authenticate(Arc::new(remote.clone())).await;

        assert_eq!(remote.pushes().len(), 1);
        assert_eq!(remote.solves().unwrap().len(), 1);
        let status = engine.status();
        assert!(!status.is_syncing);
        assert!(status.last_sync_time.is_some());
        assert!(status.error.is_none());
        assert_eq!(
            storage.get(&watermark_key(SOLVES_KEY)).unwrap(),
            status.last_sync_time.map(|t| t.to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn newer_remote_replaces_local() {
        let storage = MemoryStorage::new();
        storage.set(&watermark_key(SOLVES_KEY), "1000").unwrap();
        let engine = open_solves(&storage);
        engine.update(|s| s.push(solve(99_000.0)));

        let remote = MockRemote::new();
        let remote_solves = vec![solve(8_000.0), solve(9_000.0)];
        remote.set_solves(remote_solves.clone(), stamp(5_000));

        engine.authenticate(Arc::new(remote.clone())).await;

        assert_eq!(engine.get().into_vec(), remote_solves);
        assert!(remote.pushes().is_empty());
        assert_eq!(engine.watermark(), Some(5_000));
        assert_eq!(engine.status().last_sync_time, Some(5_000));

        let stored: SolveStore =
            serde_json::from_str(&storage.get(SOLVES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(
            storage.get(&watermark_key(SOLVES_KEY)).unwrap().as_deref(),
            Some("5000")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn equal_or_older_remote_gets_local_pushed() {
        for remote_stamp in [5_000, 4_000] {
            let storage = MemoryStorage::new();
            storage.set(&watermark_key(SOLVES_KEY), "5000").unwrap();
            let engine = open_solves(&storage);
            engine.update(|s| s.push(solve(7_000.0)));
            let local = engine.get();

            let remote = MockRemote::new();
            remote.set_solves(vec![solve(1_000.0)], stamp(remote_stamp));
            engine.authenticate(Arc::new(remote.clone())).await;

            assert_eq!(engine.get(), local);
            assert_eq!(remote.pushes().len(), 1);
            assert_eq!(remote.solves().unwrap(), local.into_vec());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resync_keeps_solve_recorded_after_both_values_synced() {
        let storage = MemoryStorage::new();
        let remote = MockRemote::new();
        let solves = open_solves(&storage);
        let settings: SyncEngine<Settings> =
            SyncEngine::open(Arc::new(storage.clone()), EngineConfig::default());
        solves.update(|s| s.push(solve(10_000.0)));

        solves.authenticate(Arc::new(remote.clone())).await;
        settings.authenticate(Arc::new(remote.clone())).await;
        solves.shutdown();
        settings.shutdown();
        // The settings push restamped the remote after the solves push.
        assert_eq!(
            storage.get(DEVICE_WATERMARK_KEY).unwrap(),
            remote.last_sync().map(|t| t.timestamp_millis().to_string())
        );

        let solves = open_solves(&storage);
        solves.update(|s| s.push(solve(11_000.0)));
        solves.authenticate(Arc::new(remote.clone())).await;

        assert_eq!(solves.with(|s| s.len()), 2);
        assert_eq!(remote.solves().map(|s| s.len()), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn pull_counts_pushes_of_other_values_on_this_device() {
        let storage = MemoryStorage::new();
        storage.set(&watermark_key(SOLVES_KEY), "1000").unwrap();
        storage.set(&watermark_key(SETTINGS_KEY), "1000").unwrap();
        let remote = MockRemote::new();
        remote.set_solves(vec![solve(1_000.0)], stamp(1_000));
        remote.set_settings(Settings::default(), stamp(1_000));

        let solves = open_solves(&storage);
        let settings: SyncEngine<Settings> =
            SyncEngine::open(Arc::new(storage.clone()), EngineConfig::default());
        solves.update(|s| s.push(solve(2_000.0)));
        let local = solves.get();

        // Settings go first and move the remote stamp past the solves watermark.
        settings.authenticate(Arc::new(remote.clone())).await;
        solves.authenticate(Arc::new(remote.clone())).await;

        assert_eq!(solves.get(), local);
        assert_eq!(remote.solves().unwrap(), local.into_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn settings_absent_remotely_are_pushed() {
        let storage = MemoryStorage::new();
        let engine: SyncEngine<Settings> =
            SyncEngine::open(Arc::new(storage), EngineConfig::default());
        let remote = MockRemote::new();
        remote.set_solves(vec![solve(1.0)], stamp(9_999_999));

        engine.authenticate(Arc::new(remote.clone())).await;
        assert_eq!(remote.settings(), Some(Settings::default()));
    }

    // ===== Debounce Tests =====

    #[tokio::test(start_paused = true)]
    async fn three_quick_mutations_push_once_with_last_value() {
        let (_, remote, engine) = synced().await;
        let before = remote.pushes().len();

        engine.update(|s| s.push(solve(1_000.0)));
        settle(Duration::from_millis(500)).await;
        engine.update(|s| s.push(solve(2_000.0)));
        settle(Duration::from_millis(500)).await;
        engine.update(|s| s.push(solve(3_000.0)));

        settle(Duration::from_millis(1_900)).await;
        assert_eq!(remote.pushes().len(), before);

        settle(Duration::from_millis(200)).await;
        let pushes = remote.pushes();
        assert_eq!(pushes.len(), before + 1);
        let pushed = pushes.last().unwrap().solves.clone().unwrap();
        assert_eq!(pushed.len(), 3);
        assert_eq!(pushed[2].time, 3_000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn signed_out_mutations_stay_local() {
        let storage = MemoryStorage::new();
        let engine = open_solves(&storage);
        engine.update(|s| s.push(solve(1.0)));
        settle(Duration::from_secs(60)).await;
        assert!(!engine.status().is_syncing);
        assert!(storage.get(SOLVES_KEY).unwrap().is_some());
    }

    // ===== Background Push Tests =====

    #[tokio::test(start_paused = true)]
    async fn interval_repushes_without_mutations() {
        let (_, remote, engine) = synced().await;
        let before = remote.pushes().len();

        settle(Duration::from_secs(61)).await;
        assert_eq!(remote.pushes().len(), before + 2);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn becoming_visible_pushes() {
        let (_, remote, engine) = synced().await;
        let before = remote.pushes().len();

        engine.set_visible(false);
        engine.set_visible(true);
        settle(Duration::from_millis(10)).await;
        assert_eq!(remote.pushes().len(), before + 1);

        // Visible → visible is not a transition.
        engine.set_visible(true);
        settle(Duration::from_millis(10)).await;
        assert_eq!(remote.pushes().len(), before + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unload_sends_beacon() {
        let (_, remote, engine) = synced().await;
        let before = remote.pushes().len();
        engine.update(|s| s.push(solve(4_242.0)));
        engine.unload();
        settle(Duration::from_millis(10)).await;

        let pushes = remote.pushes();
        assert_eq!(pushes.len(), before + 1);
        assert_eq!(pushes.last().unwrap().solves.as_ref().unwrap().len(), 1);
    }

    // ===== Failure Tests =====

    #[tokio::test(start_paused = true)]
    async fn transport_failure_retries_with_backoff() {
        let (_, remote, engine) = synced().await;
        let before = remote.pushes().len();
        remote.fail_next_push(RemoteError::Transport("reset".into()));

        engine.update(|s| s.push(solve(1.0)));
        settle(Duration::from_millis(2_100)).await;
        assert_eq!(remote.pushes().len(), before + 1);
        assert!(engine.status().error.is_none());

        // First retry after 2s.
        settle(Duration::from_millis(2_000)).await;
        assert_eq!(remote.pushes().len(), before + 2);
        assert!(engine.status().error.is_none());
        assert_eq!(remote.solves().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_error_and_keep_local_data() {
        let storage = MemoryStorage::new();
        let engine: SyncEngine<SolveStore> = SyncEngine::open(
            Arc::new(storage.clone()),
            EngineConfig::default().with_auto_sync(false),
        );
        let remote = MockRemote::new();
        engine.authenticate(Arc::new(remote.clone())).await;
        for _ in 0..6 {
            remote.fail_next_push(RemoteError::Transport("down".into()));
        }

        engine.update(|s| s.push(solve(1.0)));
        // Debounce 2s, then retries after 2 + 4 + 8 + 16 + 30 seconds.
        settle(Duration::from_secs(70)).await;

        let status = engine.status();
        assert_eq!(status.error.as_deref(), Some("transport error: down"));
        assert!(!status.is_syncing);
        assert_eq!(engine.get().len(), 1);
        assert!(storage.get(SOLVES_KEY).unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn unauthenticated_push_is_not_retried() {
        let (_, remote, engine) = synced().await;
        let before = remote.pushes().len();
        remote.fail_next_push(RemoteError::Unauthenticated);

        engine.update(|s| s.push(solve(1.0)));
        settle(Duration::from_secs(10)).await;

        assert_eq!(remote.pushes().len(), before + 1);
        assert_eq!(engine.status().error.as_deref(), Some("Not authenticated"));
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn not_configured_disables_remote_sync() {
        let engine = open_solves(&MemoryStorage::new());
        let remote = MockRemote::new();
        remote.set_configured(false);

        engine.authenticate(Arc::new(remote.clone())).await;
        assert_eq!(
            engine.status().error.as_deref(),
            Some("KV storage not configured")
        );

        engine.update(|s| s.push(solve(1.0)));
        settle(Duration::from_secs(120)).await;
        assert!(remote.pushes().is_empty());
        assert_eq!(engine.get().len(), 1);
    }

    // ===== Connectivity Tests =====

    #[tokio::test(start_paused = true)]
    async fn offline_mutations_wait_for_reconnect() {
        let (_, remote, engine) = synced().await;
        let before = remote.pushes().len();

        engine.set_online(false);
        assert_eq!(engine.status().error.as_deref(), Some(OFFLINE_MESSAGE));

        engine.update(|s| s.push(solve(1.0)));
        settle(Duration::from_secs(5)).await;
        assert_eq!(remote.pushes().len(), before);

        engine.set_online(true);
        settle(Duration::from_millis(10)).await;
        assert_eq!(remote.pushes().len(), before + 1);
        assert!(engine.status().error.is_none());
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn status_changes_are_published() {
        let engine = open_solves(&MemoryStorage::new());
        let mut rx = engine.subscribe();

        engine.set_online(false);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().error.as_deref(), Some(OFFLINE_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_stops_background_pushes() {
        let (_, remote, engine) = synced().await;
        let before = remote.pushes().len();
        engine.sign_out();
        engine.update(|s| s.push(solve(1.0)));
        settle(Duration::from_secs(90)).await;
        assert_eq!(remote.pushes().len(), before);
        assert!(!engine.is_authenticated());
    }
}
