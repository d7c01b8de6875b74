//! Cancellable scheduled callbacks.
//!
//! [`DeferredTask`] fires a callback once after a delay (debounce, backoff,
//! the hold gesture). Arming it again supersedes the pending callback.
//! [`RepeatingTask`] fires a callback on a fixed period (background push,
//! display tickers).
//!
//! Callbacks are plain synchronous closures run on the Tokio runtime.
//! Callers that need to do async work from one spawn it. Both types abort
//! their task on drop, so a scheduled callback never outlives its owner.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fire-once callback with arm / cancel.
#[derive(Debug, Default)]
pub struct DeferredTask {
    handle: Option<JoinHandle<()>>,
}

impl DeferredTask {
    /// Unarmed task.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` after `delay`, cancelling any pending callback.
    ///
    /// Must be called within a Tokio runtime.
    pub fn arm<F>(&mut self, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        }));
    }

    /// Drop the pending callback, if any. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a callback is pending.
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Periodic callback with start / cancel.
#[derive(Debug, Default)]
pub struct RepeatingTask {
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTask {
    /// Stopped task.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` every `period`, first after one full period.
    /// Replaces any running schedule.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start<F>(&mut self, period: Duration, mut callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                callback();
            }
        }));
    }

    /// Stop the schedule. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether the schedule is running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let read = {
            let count = Arc::clone(&count);
            move || count.load(Ordering::SeqCst)
        };
        (count, read)
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_fires_once_after_delay() {
        let (count, read) = counter();
        let mut task = DeferredTask::new();
        task.arm(Duration::from_millis(300), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert!(task.is_armed());

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(read(), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(read(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(read(), 1);
        assert!(!task.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_supersedes_pending_callback() {
        let (count, read) = counter();
        let mut task = DeferredTask::new();
        for _ in 0..3 {
            let count = Arc::clone(&count);
            task.arm(Duration::from_secs(2), move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(read(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_fires() {
        let (count, read) = counter();
        let mut task = DeferredTask::new();
        task.arm(Duration::from_secs(1), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();
        task.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(read(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_deferred_cancels_it() {
        let (count, read) = counter();
        {
            let mut task = DeferredTask::new();
            task.arm(Duration::from_secs(1), move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(read(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_fires_every_period() {
        let (count, read) = counter();
        let mut task = RepeatingTask::new();
        task.start(Duration::from_secs(30), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(read(), 0);
        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(read(), 3);

        task.cancel();
        assert!(!task.is_running());
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(read(), 3);
    }
}
