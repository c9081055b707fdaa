//! Run statistics: the sink for fetch observability events.
//!
//! Counters use `Cell` so the stats object can sit behind the shared
//! observer reference the fetch client takes; execution is single-threaded
//! throughout.

use crate::decode::ShapeError;
use crate::fetch::FetchObserver;
use crate::transport::TransportError;
use crate::window::RequestWindow;
use std::cell::Cell;
use std::time::Duration;

/// Aggregated per-attempt counters for a whole run.
#[derive(Debug, Default)]
pub struct RunStats {
    attempts: Cell<u64>,
    successes: Cell<u64>,
    retries: Cell<u64>,
    timeout_retries: Cell<u64>,
    exhausted: Cell<u64>,
    shape_errors: Cell<u64>,
    anomalies: Cell<u64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.get()
    }

    pub fn successes(&self) -> u64 {
        self.successes.get()
    }

    pub fn retries(&self) -> u64 {
        self.retries.get()
    }

    pub fn exhausted(&self) -> u64 {
        self.exhausted.get()
    }

    pub fn shape_errors(&self) -> u64 {
        self.shape_errors.get()
    }

    pub fn anomalies(&self) -> u64 {
        self.anomalies.get()
    }

    pub fn log_summary(&self) {
        tracing::info!(
            attempts = self.attempts.get(),
            successes = self.successes.get(),
            retries = self.retries.get(),
            timeout_retries = self.timeout_retries.get(),
            exhausted = self.exhausted.get(),
            shape_errors = self.shape_errors.get(),
            anomalies = self.anomalies.get(),
            "fetch statistics"
        );
    }
}

impl FetchObserver for RunStats {
    fn on_success(&self, window: &RequestWindow, points: usize, attempts: u32) {
        self.attempts.set(self.attempts.get() + u64::from(attempts));
        self.successes.set(self.successes.get() + 1);
        tracing::debug!(
            entity = %window.entity_id,
            start = %window.start,
            points,
            attempts,
            "window fetched"
        );
    }

    fn on_retry(&self, window: &RequestWindow, attempt: u32, error: &TransportError, delay: Duration) {
        self.retries.set(self.retries.get() + 1);
        if error.is_timeout() {
            self.timeout_retries.set(self.timeout_retries.get() + 1);
        }
        tracing::warn!(
            entity = %window.entity_id,
            start = %window.start,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "retrying window"
        );
    }

    fn on_exhausted(&self, window: &RequestWindow, attempts: u32, error: &TransportError) {
        self.attempts.set(self.attempts.get() + u64::from(attempts));
        self.exhausted.set(self.exhausted.get() + 1);
        tracing::warn!(
            entity = %window.entity_id,
            start = %window.start,
            attempts,
            error = %error,
            "retries exhausted, recording gap"
        );
    }

    fn on_shape_error(&self, window: &RequestWindow, error: &ShapeError) {
        self.attempts.set(self.attempts.get() + 1);
        self.shape_errors.set(self.shape_errors.get() + 1);
        tracing::warn!(
            entity = %window.entity_id,
            start = %window.start,
            error = %error,
            "malformed response, recording gap"
        );
    }

    fn on_anomalies(&self, window: &RequestWindow, count: usize) {
        self.anomalies.set(self.anomalies.get() + count as u64);
        tracing::warn!(
            entity = %window.entity_id,
            start = %window.start,
            count,
            "payload elements rejected by schema validation"
        );
    }
}
