use std::collections::VecDeque;
use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::api::paypal::models::TransactionQuery;
use crate::api::paypal::PayPalClient;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{ExportError, FetchError};
use crate::models::{TimeWindow, TransactionRecord, TransactionRow, MAX_WINDOW_DAYS};
use crate::utils::to_paypal_iso;

const TRANSACTIONS_ENDPOINT: &str = "GET /v1/reporting/transactions";

/// Column order of the CSV export
pub const CSV_HEADER: [&str; 6] = ["id", "time", "status", "amount", "currency", "payer_email"];

/// Lazy, ordered sequence of transactions over a time range.
///
/// The range is split into windows of at most 31 days; each window is paged
/// to exhaustion before the next one is requested. Nothing is fetched until
/// the first call to [`TransactionStream::next`]. After an error the stream
/// is finished.
pub struct TransactionStream<'a> {
    client: &'a PayPalClient,
    token: String,
    page_size: u32,
    balance_affecting_only: bool,
    windows: VecDeque<TimeWindow>,
    current: Option<TimeWindow>,
    page: u32,
    buffer: VecDeque<TransactionRecord>,
    finished: bool,
    pages_fetched: u32,
}

/// Transactions in `[start, end)`, fetched with `token`
pub fn fetch_transactions<'a>(
    client: &'a PayPalClient,
    token: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> TransactionStream<'a> {
    let windows = TimeWindow::split_range(start, end, Duration::days(MAX_WINDOW_DAYS));
    TransactionStream::from_windows(client, token, windows)
}

impl<'a> TransactionStream<'a> {
    /// Stream over explicit windows, e.g. to re-fetch a single window
    pub fn from_windows(
        client: &'a PayPalClient,
        token: &str,
        windows: impl IntoIterator<Item = TimeWindow>,
    ) -> Self {
        Self {
            client,
            token: token.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            balance_affecting_only: true,
            windows: windows.into_iter().collect(),
            current: None,
            page: 1,
            buffer: VecDeque::new(),
            finished: false,
            pages_fetched: 0,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// `false` also returns records that do not move the balance
    pub fn with_balance_affecting_only(mut self, balance_affecting_only: bool) -> Self {
        self.balance_affecting_only = balance_affecting_only;
        self
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Next record, fetching the next page or window when the buffer runs dry
    pub async fn next(&mut self) -> Result<Option<TransactionRecord>, FetchError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            if self.finished {
                return Ok(None);
            }

            let window = match self.current {
                Some(window) => window,
                None => match self.windows.pop_front() {
                    Some(window) => {
                        info!(
                            "Fetching transactions for window {} ({}h)",
                            window,
                            window.span().num_hours()
                        );
                        self.current = Some(window);
                        self.page = 1;
                        window
                    }
                    None => {
                        self.finished = true;
                        return Ok(None);
                    }
                },
            };

            if let Err(e) = self.fetch_page(window).await {
                self.finished = true;
                self.buffer.clear();
                return Err(e);
            }
        }
    }

    async fn fetch_page(&mut self, window: TimeWindow) -> Result<(), FetchError> {
        let query = TransactionQuery {
            start_date: to_paypal_iso(window.start),
            end_date: to_paypal_iso(window.end),
            page_size: self.page_size,
            page: self.page,
            balance_affecting_only: self.balance_affecting_only,
        };

        let page = self
            .client
            .get_transactions_page(&self.token, &query)
            .await
            .map_err(|e| {
                warn!("Transactions request for {} page {} failed: {}", window, self.page, e);
                FetchError::api(TRANSACTIONS_ENDPOINT)(e)
            })?;
        self.pages_fetched += 1;

        let has_more = match page.total_pages {
            Some(total_pages) => self.page < total_pages,
            None => page.has_next_link(),
        };

        let details = page.transaction_details.unwrap_or_default();
        debug!(
            "Window {} page {}: {} transactions (total_pages={:?})",
            window,
            self.page,
            details.len(),
            page.total_pages
        );
        self.buffer.extend(details.into_iter().map(TransactionRecord::from));

        if has_more {
            self.page += 1;
        } else {
            self.current = None;
        }

        Ok(())
    }

    /// Drain the stream
    pub async fn collect(mut self) -> Result<Vec<TransactionRecord>, FetchError> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        info!(
            "Fetched {} transactions in {} pages",
            records.len(),
            self.pages_fetched
        );
        Ok(records)
    }
}

/// Write records as CSV (`id,time,status,amount,currency,payer_email`).
/// The header is written even when there are no records.
pub fn export_csv<W: Write>(records: &[TransactionRecord], writer: W) -> Result<usize, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;
    for record in records {
        csv_writer.serialize(TransactionRow::from(record))?;
    }
    csv_writer.flush()?;

    Ok(records.len())
}
