use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use sqlx::mysql::MySqlPool;

use crate::models::{Amount, TransactionRecord, TransactionRow, SKIPPED_STATUSES};
use crate::utils::format_minor_units;

/// `amount_value` column text: two decimals, or the vendor's text verbatim
/// when it does not parse
pub fn stored_amount(amount: Option<&Amount>) -> String {
    match amount {
        Some(a) => a
            .minor_units()
            .map(format_minor_units)
            .unwrap_or_else(|| a.value.clone()),
        None => String::new(),
    }
}

/// Insert fetched transactions, skipping ids already stored and records
/// without an id. Returns the number of new rows.
pub async fn store_transactions(
    pool: &MySqlPool,
    records: &[TransactionRecord],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;

    for record in records.iter().filter(|r| !r.id.is_empty()) {
        let result = sqlx::query(
            "INSERT IGNORE INTO paypal_transaction (transaction_id, initiation_time, status, amount_value, currency, payer_email) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&record.id)
        .bind(record.initiation_time.map(|t| t.naive_utc()))
        .bind(&record.status)
        .bind(stored_amount(record.amount.as_ref()))
        .bind(record.amount.as_ref().map(|a| a.currency.as_str()).unwrap_or(""))
        .bind(&record.payer_email)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}

/// Initiation time of the newest stored transaction that counts as a
/// charge (denied and reversed ones are ignored)
pub async fn latest_transaction_time(pool: &MySqlPool) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let latest = sqlx::query_scalar::<_, Option<NaiveDateTime>>(
        "SELECT MAX(initiation_time) FROM paypal_transaction WHERE status NOT IN (?, ?)"
    )
    .bind(SKIPPED_STATUSES[0])
    .bind(SKIPPED_STATUSES[1])
    .fetch_one(pool)
    .await?;

    Ok(latest.map(|t| Utc.from_utc_datetime(&t)))
}

/// Stored transactions initiated at or after `since`, oldest first
pub async fn load_transactions_since(
    pool: &MySqlPool,
    since: DateTime<Utc>,
) -> Result<Vec<TransactionRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, Option<NaiveDateTime>, String, String, String, Option<String>)>(
        "SELECT transaction_id, initiation_time, status, amount_value, currency, payer_email FROM paypal_transaction WHERE initiation_time >= ? ORDER BY initiation_time, transaction_id"
    )
    .bind(since.naive_utc())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, time, status, amount, currency, payer_email)| TransactionRow {
            id,
            time: time
                .map(|t| Utc.from_utc_datetime(&t).to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            status,
            amount,
            currency,
            payer_email: payer_email.unwrap_or_default(),
        })
        .collect())
}
