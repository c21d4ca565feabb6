//! Retry scheduling with exponential backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do with an entry whose hint just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryDecision {
    /// Requeue after `delay`; `attempt` is the retry count after incrementing.
    Retry {
        /// Retry number, starting at 1.
        attempt: u32,
        /// Backoff before requeueing.
        delay: Duration,
    },
    /// Retries exhausted; the entry becomes terminal-failed.
    GiveUp,
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay unit; retry `n` waits `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff for retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Decide the next step for an entry that has failed `retry_count` times before.
    #[must_use]
    pub fn on_failure(&self, retry_count: u32) -> RetryDecision {
        if retry_count >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        let attempt = retry_count + 1;
        RetryDecision::Retry {
            attempt,
            delay: self.delay_for(attempt),
        }
    }
}
