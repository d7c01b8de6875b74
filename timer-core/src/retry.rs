//! Exponential backoff for failed pushes.
//!
//! Formula: `min(cap, base * 2^(attempt - 1))`. No jitter: there is one
//! client per user, so there is no herd to spread out.

use std::time::Duration;

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
    /// Retries allowed before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            cap: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// What to do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule retry number `attempt` after `delay`.
    Retry {
        /// 1-based retry number
        attempt: u32,
        /// How long to wait
        delay: Duration,
    },
    /// Retries exhausted; surface the error.
    GiveUp {
        /// Failures seen in this run
        failures: u32,
    },
}

/// Consecutive-failure counter. Reset by any success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    failures: u32,
}

impl RetryState {
    /// Fresh counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a failure and decide whether to retry.
    pub fn record_failure(&mut self, policy: &RetryPolicy) -> RetryDecision {
        self.failures = self.failures.saturating_add(1);
        if self.failures > policy.max_attempts {
            RetryDecision::GiveUp {
                failures: self.failures,
            }
        } else {
            RetryDecision::Retry {
                attempt: self.failures,
                delay: policy.delay_for(self.failures),
            }
        }
    }

    /// Clear the counter after a success.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Consecutive failures so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
