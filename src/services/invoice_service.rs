use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::api::paypal::models::{DateRange, SearchInvoicesRequest};
use crate::api::paypal::PayPalClient;
use crate::error::FetchError;
use crate::models::{Invoice, TimeWindow};
use crate::utils::to_paypal_iso;

const SEARCH_ENDPOINT: &str = "POST /v2/invoicing/search-invoices";
const LIST_ENDPOINT: &str = "GET /v2/invoicing/invoices";
const DETAIL_ENDPOINT: &str = "GET /v2/invoicing/invoices/{id}";
const SEND_ENDPOINT: &str = "POST /v2/invoicing/invoices/{id}/send";

/// Page size for the status search
pub const SEARCH_PAGE_SIZE: u32 = 50;

/// Statuses a payer can still pay
pub const PAYABLE_STATUSES: [&str; 2] = ["UNPAID", "SENT"];

/// One page of the unfiltered invoice listing
#[derive(Debug, Clone)]
pub struct InvoicePage {
    pub invoices: Vec<Invoice>,
    pub total_items: Option<u32>,
    pub total_pages: Option<u32>,
}

/// UNPAID and SENT invoices created inside `window`, all pages, de-duplicated by id
pub async fn list_unpaid_or_sent(
    client: &PayPalClient,
    token: &str,
    window: TimeWindow,
) -> Result<Vec<Invoice>, FetchError> {
    let body = SearchInvoicesRequest {
        status: PAYABLE_STATUSES.iter().map(|s| s.to_string()).collect(),
        created_time: DateRange {
            start: to_paypal_iso(window.start),
            end: to_paypal_iso(window.end),
        },
    };

    let mut seen = HashSet::new();
    let mut invoices = Vec::new();
    let mut page = 1;

    loop {
        let list = client
            .search_invoices(token, page, SEARCH_PAGE_SIZE, &body)
            .await
            .map_err(FetchError::api(SEARCH_ENDPOINT))?;

        let items = list.items.unwrap_or_default();
        let item_count = items.len();
        debug!("Invoice search page {}: {} items", page, item_count);

        for invoice in items.into_iter().map(Invoice::from) {
            if seen.insert(invoice.id.clone()) {
                invoices.push(invoice);
            }
        }

        let has_more = match list.total_pages {
            Some(total_pages) => page < total_pages,
            None => item_count as u32 >= SEARCH_PAGE_SIZE,
        };
        if !has_more || item_count == 0 {
            break;
        }
        page += 1;
    }

    info!("Found {} unpaid or sent invoices in {}", invoices.len(), window);
    Ok(invoices)
}

/// One page of invoices without a status filter
pub async fn list_invoices(
    client: &PayPalClient,
    token: &str,
    page: u32,
    page_size: u32,
) -> Result<InvoicePage, FetchError> {
    let list = client
        .list_invoices(token, page.max(1), page_size.max(1))
        .await
        .map_err(FetchError::api(LIST_ENDPOINT))?;

    Ok(InvoicePage {
        invoices: list
            .items
            .unwrap_or_default()
            .into_iter()
            .map(Invoice::from)
            .collect(),
        total_items: list.total_items,
        total_pages: list.total_pages,
    })
}

pub async fn get_invoice(
    client: &PayPalClient,
    token: &str,
    invoice_id: &str,
) -> Result<Invoice, FetchError> {
    client
        .get_invoice(token, invoice_id)
        .await
        .map(Invoice::from)
        .map_err(FetchError::api(DETAIL_ENDPOINT))
}

/// Send an invoice; with `share_link_only` PayPal emails nobody and only
/// generates the payer link.
pub async fn send_invoice(
    client: &PayPalClient,
    token: &str,
    invoice_id: &str,
    share_link_only: bool,
) -> Result<(), FetchError> {
    client
        .send_invoice(token, invoice_id, !share_link_only)
        .await
        .map_err(FetchError::api(SEND_ENDPOINT))
}

/// Payer URL for a payable invoice.
///
/// When the invoice is payable but has no payer URL yet, it is sent
/// link-only and fetched once more. `None` for invoices that are not
/// payable, or still have no URL after the send.
pub async fn resolve_pay_link(
    client: &PayPalClient,
    token: &str,
    invoice_id: &str,
) -> Result<Option<String>, FetchError> {
    let invoice = get_invoice(client, token, invoice_id).await?;

    if !invoice.status.is_payable() {
        debug!("Invoice {} is {}; no pay link", invoice_id, invoice.status);
        return Ok(None);
    }
    if invoice.payer_view_url.is_some() {
        return Ok(invoice.payer_view_url);
    }

    info!("Invoice {} has no payer link yet; sending link-only", invoice_id);
    send_invoice(client, token, invoice_id, true).await?;

    let refreshed = get_invoice(client, token, invoice_id).await?;
    if refreshed.payer_view_url.is_none() {
        warn!("Invoice {} still has no payer link after send", invoice_id);
    }
    Ok(refreshed.payer_view_url)
}

/// Most recent invoice by invoice date, then creation time
pub fn latest_unpaid(invoices: &[Invoice]) -> Option<&Invoice> {
    invoices
        .iter()
        .filter(|i| i.status.is_payable())
        .min_by(|a, b| Invoice::cmp_latest_first(a, b))
}

/// `(invoice_id, pay_url)` for the newest unpaid invoice in `window`, if any
pub async fn pay_link_for_latest_unpaid(
    client: &PayPalClient,
    token: &str,
    window: TimeWindow,
) -> Result<Option<(String, Option<String>)>, FetchError> {
    let invoices = list_unpaid_or_sent(client, token, window).await?;

    let Some(latest) = latest_unpaid(&invoices) else {
        info!("No unpaid invoices in {}", window);
        return Ok(None);
    };

    let url = resolve_pay_link(client, token, &latest.id).await?;
    Ok(Some((latest.id.clone(), url)))
}
