use chrono::Utc;
use tracing::info;

use super::AppContext;
use crate::error::AppError;
use crate::models::AccessToken;
use crate::utils::Table;

pub async fn execute(
    ctx: &AppContext,
    code: Option<&str>,
    refresh: Option<&str>,
) -> Result<(), AppError> {
    let token = match (code, refresh) {
        (Some(code), _) => ctx.tokens.exchange_authorization_code(code).await?,
        (None, Some(refresh)) => ctx.tokens.refresh(refresh).await?,
        (None, None) => ctx.tokens.get_token().await?,
    };

    info!("Token ready ({:?} mode)", ctx.tokens.mode());
    print!("{}", render(&token));
    Ok(())
}

fn render(token: &AccessToken) -> String {
    let now = Utc::now();
    let remaining = token.remaining_at(now);

    let mut table = Table::new(&["Field", "Value"]);
    table.add_row(&["Client", token.client_id.as_str()]);
    table.add_row(&["Kind", token.kind.as_str()]);
    table.add_row(&["Type", token.token_type.as_str()]);
    table.add_row(&["Scope", token.scope.as_deref().unwrap_or("-")]);
    table.add_row(&["Issued", token.issued_at.to_rfc3339().as_str()]);
    table.add_row(&["Expires", token.expires_at.to_rfc3339().as_str()]);
    table.add_row(&[
        "Remaining",
        format!("{}m {}s", remaining.num_minutes(), remaining.num_seconds() % 60).as_str(),
    ]);
    table.add_row(&[
        "Refresh token",
        if token.refresh_token.is_some() { "yes" } else { "no" },
    ]);
    table.render()
}
