//! Property tests for month-window generation.
//!
//! For any `start <= end`, the windows must partition `[start, end]` exactly:
//! contiguous at millisecond precision, non-overlapping, first start and last
//! end equal to the inputs, and every interior boundary a calendar-month edge.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Timelike};
use proptest::prelude::*;
use traffic_core::window::month_windows;

fn ts(ms: i64) -> NaiveDateTime {
    DateTime::from_timestamp_millis(ms).unwrap().naive_utc()
}

// 2015-01-01 .. 2025-01-01 in epoch milliseconds.
const RANGE: std::ops::Range<i64> = 1_420_070_400_000..1_735_689_600_000;

proptest! {
    #[test]
    fn windows_partition_the_range(a in RANGE, b in RANGE) {
        let (start, end) = if a <= b { (ts(a), ts(b)) } else { (ts(b), ts(a)) };

        let windows: Vec<_> = month_windows("US", start, end).unwrap().collect();

        prop_assert!(!windows.is_empty());
        prop_assert_eq!(windows.first().unwrap().start, start);
        prop_assert_eq!(windows.last().unwrap().end, end);

        for w in &windows {
            prop_assert!(w.start <= w.end);
            // A window never crosses a month boundary.
            prop_assert_eq!(
                (w.start.year(), w.start.month()),
                (w.end.year(), w.end.month())
            );
        }

        for pair in windows.windows(2) {
            // Contiguous, no overlap: the next window starts one millisecond
            // after the previous one ends.
            prop_assert_eq!(pair[1].start, pair[0].end + Duration::milliseconds(1));
            // Interior boundaries are true month edges.
            let boundary = pair[1].start;
            prop_assert_eq!(boundary.day(), 1);
            prop_assert_eq!(
                (boundary.hour(), boundary.minute(), boundary.second()),
                (0, 0, 0)
            );
        }
    }

    #[test]
    fn restarting_yields_the_same_windows(a in RANGE, b in RANGE) {
        let (start, end) = if a <= b { (ts(a), ts(b)) } else { (ts(b), ts(a)) };

        let first: Vec<_> = month_windows("US", start, end).unwrap().collect();
        let second: Vec<_> = month_windows("US", start, end).unwrap().collect();
        prop_assert_eq!(first, second);
    }
}
