//! Mock remote for testing.
//!
//! Behaves like the reference endpoint (one user's keyed values plus a
//! `lastSync` stamp) and records every push for verification.

use super::{RemoteError, RemoteStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cubetime_types::{PullResponse, PushRequest, PushResponse, Settings, Solve};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mock remote for testing.
///
/// Clones share state, so a test can keep one handle and give the other
/// to the engine.
#[derive(Debug, Clone)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug)]
struct MockRemoteInner {
    solves: Option<Vec<Solve>>,
    settings: Option<Settings>,
    last_sync: Option<DateTime<Utc>>,
    configured: bool,
    reachable: bool,
    pushes: Vec<PushRequest>,
    pull_count: usize,
    pull_failures: VecDeque<RemoteError>,
    push_failures: VecDeque<RemoteError>,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockRemoteInner {
                solves: None,
                settings: None,
                last_sync: None,
                configured: true,
                reachable: true,
                pushes: Vec::new(),
                pull_count: 0,
                pull_failures: VecDeque::new(),
                push_failures: VecDeque::new(),
            })),
        }
    }
}

impl MockRemote {
    /// Create an empty, configured, reachable remote.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockRemoteInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed the remote solve list and stamp.
    pub fn set_solves(&self, solves: Vec<Solve>, last_sync: DateTime<Utc>) {
        let mut inner = self.lock();
        inner.solves = Some(solves);
        inner.last_sync = Some(last_sync);
    }

    /// Seed the remote settings and stamp.
    pub fn set_settings(&self, settings: Settings, last_sync: DateTime<Utc>) {
        let mut inner = self.lock();
        inner.settings = Some(settings);
        inner.last_sync = Some(last_sync);
    }

    /// Behave as an endpoint whose store is not provisioned.
    pub fn set_configured(&self, configured: bool) {
        self.lock().configured = configured;
    }

    /// Fail every call with a transport error while unreachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Cause the next pull to fail with the given error.
    pub fn fail_next_pull(&self, error: RemoteError) {
        self.lock().pull_failures.push_back(error);
    }

    /// Cause the next push to fail with the given error. Calls queue up.
    pub fn fail_next_push(&self, error: RemoteError) {
        self.lock().push_failures.push_back(error);
    }

    /// Every push that reached the remote, including failed ones.
    pub fn pushes(&self) -> Vec<PushRequest> {
        self.lock().pushes.clone()
    }

    /// The last push that reached the remote.
    pub fn last_push(&self) -> Option<PushRequest> {
        self.lock().pushes.last().cloned()
    }

    /// Number of pulls served.
    pub fn pull_count(&self) -> usize {
        self.lock().pull_count
    }

    /// Current remote solve list.
    pub fn solves(&self) -> Option<Vec<Solve>> {
        self.lock().solves.clone()
    }

    /// Current remote settings.
    pub fn settings(&self) -> Option<Settings> {
        self.lock().settings.clone()
    }

    /// Current remote stamp.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.lock().last_sync
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn pull(&self) -> Result<PullResponse, RemoteError> {
        let mut inner = self.lock();
        inner.pull_count += 1;

        if !inner.reachable {
            return Err(RemoteError::Transport("unreachable".into()));
        }
        if let Some(error) = inner.pull_failures.pop_front() {
            return Err(error);
        }
        if !inner.configured {
            return Err(RemoteError::NotConfigured);
        }

        Ok(PullResponse::ok(
            inner.solves.clone().unwrap_or_default(),
            inner.settings.clone(),
            inner.last_sync,
        ))
    }

    async fn push(&self, request: PushRequest) -> Result<PushResponse, RemoteError> {
        let mut inner = self.lock();

        if !inner.reachable {
            return Err(RemoteError::Transport("unreachable".into()));
        }
        inner.pushes.push(request.clone());

        if let Some(error) = inner.push_failures.pop_front() {
            return Err(error);
        }
        if !inner.configured {
            return Err(RemoteError::NotConfigured);
        }

        let now = Utc::now();
        if let Some(solves) = request.solves {
            inner.solves = Some(solves);
            inner.last_sync = Some(now);
        }
        if let Some(settings) = request.settings {
            inner.settings = Some(settings);
            inner.last_sync = Some(now);
        }
        Ok(PushResponse::ok(inner.last_sync))
    }
}
