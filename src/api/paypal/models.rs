use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OAuth client credentials for one PayPal REST app
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Grant used against POST /v1/oauth2/token
#[derive(Debug, Clone, Copy)]
pub enum GrantType<'a> {
    ClientCredentials,
    AuthorizationCode(&'a str),
    RefreshToken(&'a str),
}

impl<'a> GrantType<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            GrantType::ClientCredentials => "client_credentials",
            GrantType::AuthorizationCode(_) => "authorization_code",
            GrantType::RefreshToken(_) => "refresh_token",
        }
    }

    /// Form fields sent with the token request
    pub fn form(&self) -> Vec<(&'static str, &'a str)> {
        match *self {
            GrantType::ClientCredentials => vec![("grant_type", "client_credentials")],
            GrantType::AuthorizationCode(code) => {
                vec![("grant_type", "authorization_code"), ("code", code)]
            }
            GrantType::RefreshToken(token) => {
                vec![("grant_type", "refresh_token"), ("refresh_token", token)]
            }
        }
    }
}

/// Response from the OAuth token endpoint
///
/// Every field is optional on the wire; a missing `access_token` is treated
/// as an auth failure by the token service.
#[derive(Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub nonce: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("has_access_token", &self.access_token.is_some())
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Query for one page of GET /v1/reporting/transactions
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    pub start_date: String,
    pub end_date: String,
    pub page_size: u32,
    pub page: u32,
    pub balance_affecting_only: bool,
}

impl TransactionQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_date", self.start_date.clone()),
            ("end_date", self.end_date.clone()),
            ("fields", "all".to_string()),
            ("page_size", self.page_size.to_string()),
            ("page", self.page.to_string()),
            (
                "balance_affecting_records_only",
                if self.balance_affecting_only { "Y" } else { "N" }.to_string(),
            ),
        ]
    }
}

/// HATEOAS link attached to list responses
#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(default)]
    pub method: Option<String>,
}

/// One page of the transaction search API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionsPage {
    #[serde(default)]
    pub transaction_details: Option<Vec<TransactionDetail>>,
    #[serde(default)]
    pub total_items: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub links: Option<Vec<Link>>,
}

impl TransactionsPage {
    pub fn has_next_link(&self) -> bool {
        self.links
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|link| link.rel == "next")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionDetail {
    #[serde(default)]
    pub transaction_info: Option<TransactionInfo>,
    #[serde(default)]
    pub payer_info: Option<PayerInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionInfo {
    pub transaction_id: Option<String>,
    pub transaction_initiation_date: Option<String>,
    pub transaction_status: Option<String>,
    pub transaction_amount: Option<Money>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayerInfo {
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub value: String,
    pub currency_code: String,
}

/// Invoice as returned by the v2 invoicing API (list items and detail)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceResource {
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub detail: Option<InvoiceDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceDetail {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub metadata: Option<InvoiceMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceMetadata {
    pub create_time: Option<String>,
    pub recipient_view_url: Option<String>,
    pub invoicer_view_url: Option<String>,
}

/// Response of the invoice list and search endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceList {
    #[serde(default)]
    pub items: Option<Vec<InvoiceResource>>,
    #[serde(default)]
    pub total_items: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Body for POST /v2/invoicing/search-invoices
#[derive(Debug, Clone, Serialize)]
pub struct SearchInvoicesRequest {
    pub status: Vec<String>,
    pub created_time: DateRange,
}

/// Body for POST /v2/invoicing/invoices/{id}/send
#[derive(Debug, Clone, Serialize)]
pub struct SendInvoiceRequest {
    pub send_to_recipient: bool,
}

/// Error body returned by PayPal REST and OAuth endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    pub name: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub debug_id: Option<String>,
    #[serde(default)]
    pub details: Option<Vec<ErrorDetail>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    pub issue: Option<String>,
    pub description: Option<String>,
    pub field: Option<String>,
}

/// Comprehensive error type for PayPal API calls
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 400 Bad Request
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// 403 Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// 404 Not Found
    #[error("Not Found: {0}")]
    NotFound(String),
    /// 429 Too Many Requests
    #[error("Rate Limited: {0}")]
    RateLimited(String),
    /// 5xx Server Error
    #[error("Server Error ({0}): {1}")]
    ServerError(u16, String),
    /// Other non-2xx statuses
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    /// Network, TLS or timeout failure
    #[error("Request Error: {0}")]
    RequestError(String),
    /// Body did not match the expected shape
    #[error("Deserialization Error: {0}")]
    DeserializationError(String),
}

impl ApiError {
    /// HTTP status behind the error, when the vendor answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited(_) => Some(429),
            ApiError::ServerError(code, _) | ApiError::HttpError(code, _) => Some(*code),
            ApiError::RequestError(_) | ApiError::DeserializationError(_) => None,
        }
    }
}
