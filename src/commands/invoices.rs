use super::AppContext;
use crate::error::AppError;
use crate::models::Invoice;
use crate::services::invoice_service;
use crate::utils::Table;

pub async fn execute(ctx: &AppContext, days: i64) -> Result<(), AppError> {
    let window = super::recent_window(days)?;
    let token = ctx.tokens.get_token().await?;

    let mut invoices = invoice_service::list_unpaid_or_sent(&ctx.client, &token.value, window).await?;
    if invoices.is_empty() {
        println!("No unpaid or sent invoices in the last {} days", days);
        return Ok(());
    }

    invoices.sort_by(Invoice::cmp_latest_first);
    print!("{}", render(&invoices));
    Ok(())
}

fn render(invoices: &[Invoice]) -> String {
    let mut table = Table::new(&["Invoice", "Number", "Status", "Date", "Pay link"]);
    for invoice in invoices {
        table.add_row(&[
            invoice.id.clone(),
            invoice.invoice_number.clone().unwrap_or_else(|| "-".to_string()),
            invoice.status.to_string(),
            invoice
                .recency_key()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            invoice.payer_view_url.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.render()
}
