//! Reporting time windows

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Longest span the reporting API accepts in one request
pub const MAX_WINDOW_DAYS: i64 = 31;

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// `None` when `start >= end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// The `days` days ending at `now`; `None` when that reaches past the
    /// representable date range
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Option<Self> {
        let span = Duration::try_days(days.max(1))?;
        let start = now.checked_sub_signed(span)?;
        Some(Self { start, end: now })
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Split `[start, end)` into consecutive windows no longer than `max_span`.
    ///
    /// Windows are contiguous and cover the range exactly; the last one is
    /// shortened to end at `end`. An empty or inverted range yields nothing.
    pub fn split_range(start: DateTime<Utc>, end: DateTime<Utc>, max_span: Duration) -> Vec<Self> {
        let mut windows = Vec::new();
        if max_span <= Duration::zero() {
            return windows;
        }

        let mut cursor = start;
        while cursor < end {
            let next = cursor
                .checked_add_signed(max_span)
                .map_or(end, |next| next.min(end));
            windows.push(Self { start: cursor, end: next });
            cursor = next;
        }

        windows
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%dT%H:%M:%SZ"),
            self.end.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_split_example_range() {
        let windows = TimeWindow::split_range(
            day(2024, 1, 1),
            day(2024, 3, 15),
            Duration::days(MAX_WINDOW_DAYS),
        );

        assert_eq!(
            windows,
            vec![
                TimeWindow { start: day(2024, 1, 1), end: day(2024, 2, 1) },
                TimeWindow { start: day(2024, 2, 1), end: day(2024, 3, 3) },
                TimeWindow { start: day(2024, 3, 3), end: day(2024, 3, 15) },
            ]
        );
    }

    #[test]
    fn test_split_covers_range_contiguously() {
        let max = Duration::days(MAX_WINDOW_DAYS);
        let start = Utc.with_ymd_and_hms(2023, 11, 7, 13, 45, 9).unwrap();

        for extra_hours in [1i64, 24 * 31, 24 * 31 + 1, 24 * 100 + 5, 24 * 400] {
            let end = start + Duration::hours(extra_hours);
            let windows = TimeWindow::split_range(start, end, max);

            assert_eq!(windows.first().map(|w| w.start), Some(start));
            assert_eq!(windows.last().map(|w| w.end), Some(end));
            for pair in windows.windows(2) {
                assert_eq!(pair[0].end, pair[1].start, "gap or overlap");
            }
            for w in &windows {
                assert!(w.span() > Duration::zero());
                assert!(w.span() <= max, "window {} too long", w);
            }
        }
    }

    #[test]
    fn test_split_empty_and_inverted() {
        let t = day(2024, 5, 1);
        assert!(TimeWindow::split_range(t, t, Duration::days(31)).is_empty());
        assert!(TimeWindow::split_range(t, day(2024, 4, 1), Duration::days(31)).is_empty());
        assert!(TimeWindow::new(t, t).is_none());
    }

    #[test]
    fn test_display() {
        let w = TimeWindow::new(day(2024, 1, 1), day(2024, 1, 2)).unwrap();
        assert_eq!(w.to_string(), "[2024-01-01T00:00:00Z, 2024-01-02T00:00:00Z)");
    }

    #[test]
    fn test_last_days() {
        let now = day(2024, 6, 1);
        let w = TimeWindow::last_days(30, now).unwrap();
        assert_eq!(w.start, day(2024, 5, 2));
        assert_eq!(w.end, now);

        // non-positive counts widen to one day
        assert_eq!(TimeWindow::last_days(0, now).unwrap().span(), Duration::days(1));
    }

    #[test]
    fn test_split_near_max_date() {
        let end = DateTime::<Utc>::MAX_UTC;
        let start = end - Duration::days(40);
        let windows = TimeWindow::split_range(start, end, Duration::days(MAX_WINDOW_DAYS));

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].end, end);
    }

    #[test]
    fn test_last_days_out_of_range() {
        let now = day(2024, 6, 1);
        assert!(TimeWindow::last_days(i64::MAX, now).is_none());
        assert!(TimeWindow::last_days(200_000_000, now).is_none());
    }
}
