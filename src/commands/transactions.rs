use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use super::AppContext;
use crate::db;
use crate::error::{AppError, ExportError, FetchError};
use crate::services::transaction_service::{self, fetch_transactions};
use crate::utils::parse_paypal_datetime;

pub struct Options {
    pub out: Option<PathBuf>,
    pub store: bool,
    pub all_records: bool,
    pub page_size: u32,
}

/// Parse `--from` / `--to`; the range must be non-empty
pub fn parse_range(from: &str, to: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), FetchError> {
    let start = parse_paypal_datetime(from)
        .ok_or_else(|| FetchError::InvalidRange(format!("cannot parse start '{}'", from)))?;
    let end = parse_paypal_datetime(to)
        .ok_or_else(|| FetchError::InvalidRange(format!("cannot parse end '{}'", to)))?;

    if start >= end {
        return Err(FetchError::InvalidRange(format!(
            "start {} is not before end {}",
            start, end
        )));
    }
    Ok((start, end))
}

pub async fn execute(ctx: &AppContext, from: &str, to: &str, options: Options) -> Result<(), AppError> {
    let (start, end) = parse_range(from, to)?;
    let pool = if options.store {
        Some(ctx.require_pool("--store")?)
    } else {
        None
    };

    let token = ctx.tokens.get_token().await?;
    let mut stream = fetch_transactions(&ctx.client, &token.value, start, end)
        .with_page_size(options.page_size)
        .with_balance_affecting_only(!options.all_records);

    // print as they arrive when nothing needs the full list
    if options.out.is_none() && pool.is_none() {
        let mut count = 0usize;
        while let Some(record) = stream.next().await? {
            println!("{}", record);
            count += 1;
        }
        info!("Printed {} transactions", count);
        return Ok(());
    }

    let records = stream.collect().await?;

    if let Some(path) = &options.out {
        let file = File::create(path).map_err(ExportError::from)?;
        let written = transaction_service::export_csv(&records, BufWriter::new(file))?;
        info!("Wrote {} transactions to {}", written, path.display());
    }

    if let Some(pool) = pool {
        let inserted = db::transaction::store_transactions(pool, &records)
            .await
            .map_err(|e| AppError::Store(e.into()))?;
        info!(
            "Stored {} new transactions ({} already present)",
            inserted,
            records.len() as u64 - inserted
        );
    }

    Ok(())
}
