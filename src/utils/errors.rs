use crate::api::paypal::models::ErrorResponse;

const MAX_RAW_ERROR_CHARS: usize = 500;

/// Extract a readable message from a PayPal error body
///
/// PayPal REST endpoints answer with `{"name", "message", "details": [...]}`
/// while the OAuth endpoint uses `{"error", "error_description"}`:
/// "UNPROCESSABLE_ENTITY: The requested action could not be performed (INVALID_PARAMETER_VALUE)"
///
/// Bodies that are not JSON are returned trimmed and truncated.
pub fn vendor_error_message(body: &str) -> String {
    let trimmed = body.trim();

    let parsed = match serde_json::from_str::<ErrorResponse>(trimmed) {
        Ok(parsed) => parsed,
        Err(_) => return truncate(trimmed),
    };

    let headline = parsed
        .message
        .as_deref()
        .or(parsed.error_description.as_deref())
        .filter(|s| !s.is_empty());
    let name = parsed.name.as_deref().or(parsed.error.as_deref());

    let mut message = match (name, headline) {
        (Some(name), Some(text)) => format!("{}: {}", name, text),
        (Some(name), None) => name.to_string(),
        (None, Some(text)) => text.to_string(),
        (None, None) => return truncate(trimmed),
    };

    let issues: Vec<&str> = parsed
        .details
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|d| d.issue.as_deref())
        .collect();
    if !issues.is_empty() {
        message.push_str(&format!(" ({})", issues.join(", ")));
    }

    message
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_RAW_ERROR_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_RAW_ERROR_CHARS).collect();
        format!("{}...", cut)
    }
}
