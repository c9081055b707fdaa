//! Retry policy for transient transport failures.
//!
//! The decision logic is a pure function of the attempt index and the error
//! kind so the backoff schedule can be tested without a network or a clock.
//! The fetch client owns the actual sleeping.

use crate::transport::TransportError;
use std::time::Duration;

/// Exponential-backoff retry schedule: `max_retries` attempts total, delay
/// after failed attempt `n` (0-based) is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again.
    Backoff(Duration),
    /// Attempts exhausted — record the window as a gap.
    GiveUp,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Backoff delay for a failed attempt (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    /// Decide the next step after failed attempt `attempt` (0-based).
    /// Timeouts and other transport failures share one schedule.
    pub fn decide(&self, attempt: u32, _error: &TransportError) -> RetryDecision {
        if attempt + 1 >= self.max_retries {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Backoff(self.delay_for(attempt))
        }
    }
}

impl Default for RetryPolicy {
    /// Three attempts, two-second base delay.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}
