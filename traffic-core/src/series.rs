//! Per-entity time series and the timestamp renderings used on disk.
//!
//! The remote service reports timestamps as epoch milliseconds. On disk they
//! are rendered as `YYYY-MM-DD HH:MM:SS.mmm`; older files without the
//! millisecond component must still parse.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp rendering written to CSV files (millisecond precision).
pub const TIMESTAMP_FORMAT_MS: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Second-precision rendering, accepted on read for older files.
pub const TIMESTAMP_FORMAT_NO_MS: &str = "%Y-%m-%d %H:%M:%S";

/// One observation of the traffic metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Ordered series of observations for a single entity (country/region).
///
/// Built incrementally by the fetch path appending each window's points.
/// Within a series, timestamps are strictly increasing and unique. Once read
/// back from storage a series is never mutated — validation and merge treat
/// it as immutable.
#[derive(Debug, Clone)]
pub struct Series {
    pub entity_id: String,
    pub points: Vec<TimePoint>,
}

impl Series {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            points: Vec::new(),
        }
    }

    /// Append a window's worth of points. Windows arrive in chronological
    /// order, so appending preserves the ordering invariant.
    pub fn append(&mut self, points: impl IntoIterator<Item = TimePoint>) {
        self.points.extend(points);
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.points.iter().map(|p| p.timestamp)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Convert an epoch-millisecond wire timestamp to a datetime (UTC).
pub fn timestamp_from_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Convert a datetime back to epoch milliseconds (UTC).
pub fn timestamp_to_millis(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

/// Render a timestamp the way series files store it.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT_MS).to_string()
}

/// Parse a stored timestamp, accepting both precision renderings.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT_MS)
        .or_else(|_| NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT_NO_MS))
        .ok()
}
