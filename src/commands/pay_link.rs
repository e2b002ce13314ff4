use super::AppContext;
use crate::error::AppError;
use crate::services::invoice_service;

pub async fn execute(
    ctx: &AppContext,
    invoice_id: Option<&str>,
    latest: bool,
    days: i64,
) -> Result<(), AppError> {
    let token = ctx.tokens.get_token().await?;

    if latest {
        let window = super::recent_window(days)?;
        match invoice_service::pay_link_for_latest_unpaid(&ctx.client, &token.value, window).await? {
            Some((id, Some(url))) => println!("{} {}", id, url),
            Some((id, None)) => println!("{} has no payer link yet", id),
            None => println!("No unpaid invoices in the last {} days", days),
        }
        return Ok(());
    }

    let invoice_id = invoice_id
        .ok_or_else(|| AppError::Usage("an invoice id or --latest is required".to_string()))?;

    match invoice_service::resolve_pay_link(&ctx.client, &token.value, invoice_id).await? {
        Some(url) => println!("{}", url),
        None => println!("{} is not payable or has no payer link", invoice_id),
    }
    Ok(())
}
