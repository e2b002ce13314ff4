//! Recurring charge patterns

use std::fmt;

use chrono::{DateTime, Utc};

/// Transaction statuses (denied, reversed) that never count as a charge
pub const SKIPPED_STATUSES: [&str; 2] = ["D", "V"];

/// Day-of-month bucket; the 28th to 31st share one bucket so that
/// "last day of the month" charges line up across short and long months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayBucket {
    Day(u32),
    EndOfMonth,
}

impl DayBucket {
    pub fn from_day(day: u32) -> Self {
        if day >= 28 {
            Self::EndOfMonth
        } else {
            Self::Day(day)
        }
    }
}

impl fmt::Display for DayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(d) => write!(f, "day {}", d),
            Self::EndOfMonth => f.write_str("end of month"),
        }
    }
}

/// A charge seen on the same day of the month in several distinct months
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringPattern {
    /// Normalized payer email
    pub payee: String,
    pub day_bucket: DayBucket,
    /// Absolute amount rounded to whole currency units
    pub approx_amount: i64,
    pub currency: String,
    /// Number of distinct calendar months the charge appeared in
    pub count: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub description: String,
}

impl RecurringPattern {
    pub fn describe(
        payee: &str,
        day_bucket: DayBucket,
        approx_amount: i64,
        currency: &str,
        count: usize,
    ) -> String {
        let who = if payee.is_empty() { "unknown payee" } else { payee };
        format!(
            "~{} {} to {} on {}, seen in {} months",
            approx_amount, currency, who, day_bucket, count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_month_bucket() {
        assert_eq!(DayBucket::from_day(1), DayBucket::Day(1));
        assert_eq!(DayBucket::from_day(27), DayBucket::Day(27));
        for d in 28..=31 {
            assert_eq!(DayBucket::from_day(d), DayBucket::EndOfMonth);
        }
        assert!(DayBucket::Day(27) < DayBucket::EndOfMonth);
    }

    #[test]
    fn test_description() {
        assert_eq!(
            RecurringPattern::describe("billing@gym.example", DayBucket::Day(1), 50, "USD", 4),
            "~50 USD to billing@gym.example on day 1, seen in 4 months"
        );
        assert!(RecurringPattern::describe("", DayBucket::EndOfMonth, 9, "EUR", 3)
            .contains("unknown payee on end of month"));
    }
}
