//! Calendar-month request windows.
//!
//! The remote service chooses data granularity from the requested window
//! length, so an arbitrary date range is split into month-aligned windows
//! before fetching: one API call per (entity, window).

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// One bounded date range submitted as a single API request.
///
/// Consecutive windows for the same range partition it: no gap, no overlap,
/// millisecond precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestWindow {
    pub entity_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Reject a range before any I/O happens.
pub fn validate_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), WindowError> {
    if start > end {
        return Err(WindowError::InvalidRange { start, end });
    }
    Ok(())
}

/// Lazily split `[start, end]` into month-aligned windows in chronological
/// order.
///
/// The first window starts at `start` and the last ends at `end` even when
/// those are not month boundaries; every interior boundary is a true
/// calendar-month edge. `start == end` yields exactly one window.
pub fn month_windows(
    entity_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<MonthWindows, WindowError> {
    validate_range(start, end)?;
    Ok(MonthWindows {
        entity_id: entity_id.to_string(),
        cursor: Some(start),
        end,
    })
}

/// Iterator produced by [`month_windows`]. Restartable by calling
/// [`month_windows`] again (or cloning before iteration).
#[derive(Debug, Clone)]
pub struct MonthWindows {
    entity_id: String,
    cursor: Option<NaiveDateTime>,
    end: NaiveDateTime,
}

impl Iterator for MonthWindows {
    type Item = RequestWindow;

    fn next(&mut self) -> Option<RequestWindow> {
        let start = self.cursor.take()?;
        let month_last = last_instant_of_month(start.date());
        let end = if month_last < self.end {
            self.cursor = Some(month_last + Duration::milliseconds(1));
            month_last
        } else {
            self.end
        };
        Some(RequestWindow {
            entity_id: self.entity_id.clone(),
            start,
            end,
        })
    }
}

/// Last representable instant of `date`'s month at millisecond precision.
fn last_instant_of_month(date: NaiveDate) -> NaiveDateTime {
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    next_month.unwrap().and_hms_opt(0, 0, 0).unwrap() - Duration::milliseconds(1)
}
