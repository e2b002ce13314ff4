use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{debug, info};

use crate::error::ExportError;
use crate::models::{DayBucket, RecurringPattern, TransactionRow, SKIPPED_STATUSES};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;
pub const DEFAULT_MIN_OCCURRENCES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurringConfig {
    /// Rows older than the newest row minus this many days are ignored
    pub lookback_days: i64,
    /// Distinct calendar months a charge must appear in
    pub min_occurrences: usize,
}

impl Default for RecurringConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    payee: String,
    day_bucket: DayBucket,
    approx_amount: i64,
    currency: String,
}

struct Group {
    months: BTreeSet<(i32, u32)>,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

struct Charge {
    key: GroupKey,
    time: DateTime<Utc>,
}

/// Oldest time still inside the lookback period ending at `latest`.
///
/// `None` when the period reaches past the representable date range, in
/// which case nothing is old enough to drop.
pub fn lookback_cutoff(latest: DateTime<Utc>, lookback_days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(lookback_days.max(0)).and_then(|span| latest.checked_sub_signed(span))
}

fn to_charge(row: &TransactionRow) -> Option<Charge> {
    let status = row.status.trim().to_ascii_uppercase();
    if SKIPPED_STATUSES.contains(&status.as_str()) {
        return None;
    }

    let time = row.parsed_time()?;
    let minor = row.amount_minor()?;
    // amounts too large to round are not charges
    let approx_amount = minor.checked_abs()?.checked_add(50)? / 100;

    Some(Charge {
        key: GroupKey {
            payee: row.payer_email.trim().to_lowercase(),
            day_bucket: DayBucket::from_day(time.day()),
            approx_amount,
            currency: row.currency.trim().to_ascii_uppercase(),
        },
        time,
    })
}

/// Find charges that repeat on the same day of the month.
///
/// Rows are grouped by payee, day-of-month bucket, amount rounded to whole
/// units and currency. A group is reported when it spans at least
/// `min_occurrences` distinct calendar months within the lookback period.
/// Output is ordered by count (highest first), then payee, day and amount.
pub fn detect_recurring(rows: &[TransactionRow], config: &RecurringConfig) -> Vec<RecurringPattern> {
    let charges: Vec<Charge> = rows.iter().filter_map(to_charge).collect();

    let Some(latest) = charges.iter().map(|c| c.time).max() else {
        return Vec::new();
    };
    let cutoff = lookback_cutoff(latest, config.lookback_days);

    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();
    for charge in charges
        .into_iter()
        .filter(|c| cutoff.map_or(true, |cutoff| c.time >= cutoff))
    {
        let month = (charge.time.year(), charge.time.month());
        groups
            .entry(charge.key)
            .and_modify(|g| {
                g.months.insert(month);
                g.first_seen = g.first_seen.min(charge.time);
                g.last_seen = g.last_seen.max(charge.time);
            })
            .or_insert_with(|| Group {
                months: BTreeSet::from([month]),
                first_seen: charge.time,
                last_seen: charge.time,
            });
    }
    debug!("{} charge groups since {:?}", groups.len(), cutoff);

    let mut patterns: Vec<RecurringPattern> = groups
        .into_iter()
        .filter(|(_, g)| g.months.len() >= config.min_occurrences.max(1))
        .map(|(key, g)| {
            let count = g.months.len();
            RecurringPattern {
                description: RecurringPattern::describe(
                    &key.payee,
                    key.day_bucket,
                    key.approx_amount,
                    &key.currency,
                    count,
                ),
                payee: key.payee,
                day_bucket: key.day_bucket,
                approx_amount: key.approx_amount,
                currency: key.currency,
                count,
                first_seen: g.first_seen,
                last_seen: g.last_seen,
            }
        })
        .collect();

    patterns.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.payee.cmp(&b.payee))
            .then_with(|| a.day_bucket.cmp(&b.day_bucket))
            .then_with(|| a.approx_amount.cmp(&b.approx_amount))
            .then_with(|| a.currency.cmp(&b.currency))
    });

    info!("Detected {} recurring patterns", patterns.len());
    patterns
}

/// Read rows from a transactions CSV export (header required)
pub fn read_rows_csv<R: Read>(reader: R) -> Result<Vec<TransactionRow>, ExportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let rows = csv_reader
        .deserialize::<TransactionRow>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
