use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use tracing::info;

use super::context::connect_database;
use crate::db;
use crate::error::{AppError, ExportError};
use crate::models::RecurringPattern;
use crate::services::recurring_service::{
    detect_recurring, lookback_cutoff, read_rows_csv, RecurringConfig,
};
use crate::utils::Table;

pub async fn execute(
    csv: Option<PathBuf>,
    from_db: bool,
    lookback_days: i64,
    min_occurrences: usize,
) -> Result<(), AppError> {
    let config = RecurringConfig {
        lookback_days,
        min_occurrences,
    };

    let rows = match csv {
        Some(path) => {
            let file = File::open(&path).map_err(ExportError::from)?;
            let rows = read_rows_csv(BufReader::new(file))?;
            info!("Read {} rows from {}", rows.len(), path.display());
            rows
        }
        None if from_db => {
            let pool = connect_database().await?;
            let latest = db::transaction::latest_transaction_time(&pool)
                .await
                .map_err(|e| AppError::Store(e.into()))?;
            match latest {
                Some(latest) => {
                    let since = lookback_cutoff(latest, lookback_days).ok_or_else(|| {
                        AppError::Usage(format!(
                            "--lookback-days {} reaches past the supported date range",
                            lookback_days
                        ))
                    })?;
                    db::transaction::load_transactions_since(&pool, since)
                        .await
                        .map_err(|e| AppError::Store(e.into()))?
                }
                None => Vec::new(),
            }
        }
        None => return Err(AppError::Usage("either --csv or --from-db is required".to_string())),
    };

    let patterns = detect_recurring(&rows, &config);
    if patterns.is_empty() {
        println!("No recurring payments found");
    } else {
        print!("{}", render(&patterns));
    }
    Ok(())
}

fn render(patterns: &[RecurringPattern]) -> String {
    let mut table = Table::new(&["Payee", "Day", "Amount", "Currency", "Months", "First", "Last"]);
    for p in patterns {
        table.add_row(&[
            p.payee.clone(),
            p.day_bucket.to_string(),
            format!("~{}", p.approx_amount),
            p.currency.clone(),
            p.count.to_string(),
            p.first_seen.format("%Y-%m-%d").to_string(),
            p.last_seen.format("%Y-%m-%d").to_string(),
        ]);
    }
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Amount, TransactionRecord};
    use crate::services::transaction_service::export_csv;
    use chrono::{TimeZone, Utc};

    fn charge(id: &str, month: u32) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            initiation_time: Some(Utc.with_ymd_and_hms(2024, month, 1, 9, 0, 0).unwrap()),
            status: "S".to_string(),
            amount: Some(Amount {
                value: "-50.00".to_string(),
                currency: "USD".to_string(),
            }),
            payer_email: Some("billing@gym.example".to_string()),
        }
    }

    #[tokio::test]
    async fn test_detect_from_exported_csv() {
        let records: Vec<TransactionRecord> =
            (2..=5).map(|m| charge(&format!("T{}", m), m)).collect();

        let file = tempfile::NamedTempFile::new().unwrap();
        export_csv(&records, file.reopen().unwrap()).unwrap();

        let rows = read_rows_csv(File::open(file.path()).unwrap()).unwrap();
        let patterns = detect_recurring(&rows, &RecurringConfig::default());
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].count, 4);

        let rendered = render(&patterns);
        assert!(rendered.contains("billing@gym.example"));
        assert!(rendered.contains("day 1"));

        execute(Some(file.path().to_path_buf()), false, 90, 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_csv_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(Some(dir.path().join("absent.csv")), false, 90, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Export(ExportError::Io(_))));
    }
}
