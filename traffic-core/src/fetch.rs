//! Windowed fetch client with retry, backoff, and gap accounting.
//!
//! One request per (entity, window). Transient transport failures are
//! retried on the policy's exponential schedule; exhaustion degrades to a
//! recorded gap, never a raised error. Structural problems with the body are
//! not retried at all — the raw payload is handed back so the caller can
//! persist it out of band.

use crate::decode::{decode_body, ShapeError};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::series::TimePoint;
use crate::transport::{Transport, TransportError};
use crate::window::RequestWindow;
use std::time::Duration;

/// Why a window produced no data.
#[derive(Debug)]
pub enum GapReason {
    /// Body was malformed or unrecognized; never retried.
    Shape(ShapeError),
    /// Transport kept failing until the retry budget ran out.
    Exhausted(TransportError),
}

/// A declared data gap: recorded, not fatal to the run.
#[derive(Debug)]
pub struct Gap {
    pub reason: GapReason,
    /// Raw response body, preserved for shape failures so the caller can
    /// write it to the error directory.
    pub raw_body: Option<String>,
}

/// Outcome of fetching one window. `points` is empty when `gap` is set.
#[derive(Debug)]
pub struct WindowFetch {
    pub points: Vec<TimePoint>,
    pub anomaly_count: usize,
    pub gap: Option<Gap>,
    pub attempts: u32,
}

impl WindowFetch {
    pub fn is_gap(&self) -> bool {
        self.gap.is_some()
    }
}

/// Per-attempt observability channel. The download orchestrator aggregates
/// these events into run statistics.
pub trait FetchObserver {
    /// A window decoded successfully (possibly with element anomalies).
    fn on_success(&self, window: &RequestWindow, points: usize, attempts: u32);

    /// A transport failure that will be retried after `delay`.
    fn on_retry(&self, window: &RequestWindow, attempt: u32, error: &TransportError, delay: Duration);

    /// The retry budget ran out; the window becomes a gap.
    fn on_exhausted(&self, window: &RequestWindow, attempts: u32, error: &TransportError);

    /// The body was structurally unusable; the window becomes a gap.
    fn on_shape_error(&self, window: &RequestWindow, error: &ShapeError);

    /// Individual elements were rejected by schema validation.
    fn on_anomalies(&self, window: &RequestWindow, count: usize);
}

/// Fetch client: courtesy delay, retry loop, decode.
pub struct FetchClient {
    transport: Box<dyn Transport>,
    policy: RetryPolicy,
    /// Applied before every request, independent of retry backoff. Exists to
    /// avoid hammering the remote endpoint — must not be parallelized away.
    request_delay: Duration,
}

impl FetchClient {
    pub fn new(transport: Box<dyn Transport>, policy: RetryPolicy, request_delay: Duration) -> Self {
        Self {
            transport,
            policy,
            request_delay,
        }
    }

    /// Fetch one window. Always returns an outcome; failures are absorbed
    /// into the gap field.
    pub fn fetch_window(&self, window: &RequestWindow, observer: &dyn FetchObserver) -> WindowFetch {
        if !self.request_delay.is_zero() {
            std::thread::sleep(self.request_delay);
        }

        let mut attempts = 0u32;
        loop {
            let body = match self.transport.fetch_raw(window) {
                Ok(body) => body,
                Err(err) => {
                    attempts += 1;
                    match self.policy.decide(attempts - 1, &err) {
                        RetryDecision::Backoff(delay) => {
                            observer.on_retry(window, attempts, &err, delay);
                            if !delay.is_zero() {
                                std::thread::sleep(delay);
                            }
                            continue;
                        }
                        RetryDecision::GiveUp => {
                            observer.on_exhausted(window, attempts, &err);
                            return WindowFetch {
                                points: Vec::new(),
                                anomaly_count: 0,
                                gap: Some(Gap {
                                    reason: GapReason::Exhausted(err),
                                    raw_body: None,
                                }),
                                attempts,
                            };
                        }
                    }
                }
            };

            attempts += 1;
            return match decode_body(&body) {
                Ok(decoded) => {
                    if !decoded.anomalies.is_empty() {
                        observer.on_anomalies(window, decoded.anomalies.len());
                    }
                    observer.on_success(window, decoded.points.len(), attempts);
                    WindowFetch {
                        anomaly_count: decoded.anomalies.len(),
                        points: decoded.points,
                        gap: None,
                        attempts,
                    }
                }
                Err(shape) => {
                    observer.on_shape_error(window, &shape);
                    WindowFetch {
                        points: Vec::new(),
                        anomaly_count: 0,
                        gap: Some(Gap {
                            reason: GapReason::Shape(shape),
                            raw_body: Some(body),
                        }),
                        attempts,
                    }
                }
            };
        }
    }
}
