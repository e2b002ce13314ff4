//! `paysync` subcommands

pub mod context;
pub mod invoices;
pub mod pay_link;
pub mod recurring;
pub mod token;
pub mod transactions;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::AppError;
use crate::models::TimeWindow;
use crate::services::recurring_service::{DEFAULT_LOOKBACK_DAYS, DEFAULT_MIN_OCCURRENCES};
pub use context::AppContext;

/// Default invoice search window
pub const DEFAULT_INVOICE_DAYS: i64 = 365;

/// Upper bound for day-count flags (about a century)
pub const MAX_DAYS_FLAG: i64 = 36_500;

#[derive(Parser)]
#[command(name = "paysync", version, about = "PayPal token, transaction and invoice sync")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Obtain an access token and print its metadata (never the token itself)
    #[command(after_help = "\
Examples:
  paysync token
  paysync token --code <authorization-code>
  paysync token --refresh <refresh-token>")]
    Token {
        /// Exchange an OAuth authorization code instead of client credentials
        #[arg(long, conflicts_with = "refresh")]
        code: Option<String>,

        /// Use a refresh token
        #[arg(long)]
        refresh: Option<String>,
    },

    /// Fetch transactions from the reporting API
    #[command(after_help = "\
Examples:
  paysync transactions --from 2024-01-01 --to 2024-03-15
  paysync transactions --from 2024-01-01 --to 2024-03-15 --out transactions.csv
  paysync transactions --from 2024-01-01T00:00:00Z --to 2024-02-01T00:00:00Z --store")]
    Transactions {
        /// Start, inclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        from: String,

        /// End, exclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        to: String,

        /// Write a CSV export instead of printing
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also insert into the paypal_transaction table
        #[arg(long)]
        store: bool,

        /// Include records that do not affect the balance
        #[arg(long)]
        all_records: bool,

        /// Page size (default: PAYPAL_PAGE_SIZE or 500)
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// List UNPAID and SENT invoices
    Invoices {
        /// Created within the last N days
        #[arg(long, default_value_t = DEFAULT_INVOICE_DAYS, value_parser = clap::value_parser!(i64).range(1..=MAX_DAYS_FLAG))]
        days: i64,
    },

    /// Resolve the payer link of an invoice
    #[command(after_help = "\
Examples:
  paysync pay-link INV2-XXXX-XXXX-XXXX-XXXX
  paysync pay-link --latest --days 90")]
    PayLink {
        /// Invoice id
        #[arg(required_unless_present = "latest")]
        invoice_id: Option<String>,

        /// Use the most recent unpaid invoice
        #[arg(long, conflicts_with = "invoice_id")]
        latest: bool,

        /// Search window for --latest
        #[arg(long, default_value_t = DEFAULT_INVOICE_DAYS, value_parser = clap::value_parser!(i64).range(1..=MAX_DAYS_FLAG))]
        days: i64,
    },

    /// Detect recurring charges in exported transactions
    #[command(after_help = "\
Examples:
  paysync recurring --csv transactions.csv
  paysync recurring --from-db --lookback-days 120 --min-occurrences 4")]
    Recurring {
        /// CSV produced by `paysync transactions --out`
        #[arg(long, required_unless_present = "from_db", conflicts_with = "from_db")]
        csv: Option<PathBuf>,

        /// Read rows from the paypal_transaction table
        #[arg(long)]
        from_db: bool,

        #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS, value_parser = clap::value_parser!(i64).range(1..=MAX_DAYS_FLAG))]
        lookback_days: i64,

        #[arg(long, default_value_t = DEFAULT_MIN_OCCURRENCES)]
        min_occurrences: usize,
    },
}

/// Run one subcommand
pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Token { code, refresh } => {
            let ctx = paypal_context().await?;
            token::execute(&ctx, code.as_deref(), refresh.as_deref()).await
        }
        Command::Transactions {
            from,
            to,
            out,
            store,
            all_records,
            page_size,
        } => {
            let ctx = paypal_context().await?;
            let options = transactions::Options {
                out,
                store,
                all_records,
                page_size: page_size.unwrap_or(ctx.config.page_size),
            };
            transactions::execute(&ctx, &from, &to, options).await
        }
        Command::Invoices { days } => {
            let ctx = paypal_context().await?;
            invoices::execute(&ctx, days).await
        }
        Command::PayLink {
            invoice_id,
            latest,
            days,
        } => {
            let ctx = paypal_context().await?;
            pay_link::execute(&ctx, invoice_id.as_deref(), latest, days).await
        }
        // works offline; needs no PayPal credentials
        Command::Recurring {
            csv,
            from_db,
            lookback_days,
            min_occurrences,
        } => recurring::execute(csv, from_db, lookback_days, min_occurrences).await,
    }
}

async fn paypal_context() -> Result<AppContext, AppError> {
    AppContext::init(Config::from_env()?).await
}

/// Window of the last `days` days, as a usage error when out of range
pub(crate) fn recent_window(days: i64) -> Result<TimeWindow, AppError> {
    TimeWindow::last_days(days, Utc::now())
        .ok_or_else(|| AppError::Usage(format!("--days {} reaches past the supported date range", days)))
}
