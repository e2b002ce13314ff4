use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::models::{
    ApiError, ClientCredentials, GrantType, InvoiceList, InvoiceResource, SearchInvoicesRequest,
    SendInvoiceRequest, TokenResponse, TransactionQuery, TransactionsPage,
};
use crate::utils::vendor_error_message;

/// PayPal REST API client
///
/// Holds no credentials: callers pass a bearer token (or client
/// credentials for the OAuth endpoint) per call.
#[derive(Debug, Clone)]
pub struct PayPalClient {
    http_client: HttpClient,
    base_url: String,
}

impl PayPalClient {
    pub const SANDBOX_BASE_URL: &'static str = "https://api-m.sandbox.paypal.com";
    pub const LIVE_BASE_URL: &'static str = "https://api-m.paypal.com";

    /// Create a client whose requests time out after `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("paysync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client with default HTTP settings against a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `/v2/invoicing/invoices/{invoice_id}[/{action}]` with the id as one
    /// escaped path segment
    fn invoice_url(&self, invoice_id: &str, action: Option<&str>) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::RequestError(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ApiError::RequestError(format!("Base URL '{}' cannot take a path", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["v2", "invoicing", "invoices", invoice_id]);
            if let Some(action) = action {
                segments.push(action);
            }
        }

        Ok(url)
    }

    /// JSON headers with bearer authorization
    fn bearer_headers(token: &str) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::RequestError(format!("Failed to create auth header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Map a non-2xx response to an `ApiError` carrying the vendor's text
    async fn handle_error_response(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ApiError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();
        let message = vendor_error_message(&body_text);

        match status_code {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            429 => {
                warn!("PayPal rate limited the request: {}", message);
                ApiError::RateLimited(message)
            }
            500..=599 => {
                warn!("PayPal server error {}: {}", status_code, message);
                ApiError::ServerError(status_code, message)
            }
            _ => ApiError::HttpError(status_code, message),
        }
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::RequestError(format!("Request timed out: {}", e))
            } else {
                ApiError::RequestError(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        Self::send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)))
    }

    /// POST /v1/oauth2/token
    ///
    /// Basic-authenticated with the app credentials. `timeout` overrides the
    /// client default so token calls can fail faster than data calls.
    pub async fn request_token(
        &self,
        credentials: &ClientCredentials,
        grant: GrantType<'_>,
        timeout: Duration,
    ) -> Result<TokenResponse, ApiError> {
        let url = format!("{}/v1/oauth2/token", self.base_url);
        debug!("POST {} (grant_type={})", url, grant.name());

        let request = self
            .http_client
            .post(&url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .header(ACCEPT, "application/json")
            .form(&grant.form())
            .timeout(timeout);

        Self::read_json(request).await
    }

    /// GET /v1/reporting/transactions
    pub async fn get_transactions_page(
        &self,
        token: &str,
        query: &TransactionQuery,
    ) -> Result<TransactionsPage, ApiError> {
        let url = format!("{}/v1/reporting/transactions", self.base_url);
        let request = self
            .http_client
            .get(&url)
            .headers(Self::bearer_headers(token)?)
            .query(&query.to_params());

        Self::read_json(request).await
    }

    /// POST /v2/invoicing/search-invoices
    pub async fn search_invoices(
        &self,
        token: &str,
        page: u32,
        page_size: u32,
        body: &SearchInvoicesRequest,
    ) -> Result<InvoiceList, ApiError> {
        let url = format!("{}/v2/invoicing/search-invoices", self.base_url);
        let request = self
            .http_client
            .post(&url)
            .headers(Self::bearer_headers(token)?)
            .query(&[
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
                ("total_required", "true".to_string()),
            ])
            .json(body);

        Self::read_json(request).await
    }

    /// GET /v2/invoicing/invoices
    pub async fn list_invoices(
        &self,
        token: &str,
        page: u32,
        page_size: u32,
    ) -> Result<InvoiceList, ApiError> {
        let url = format!("{}/v2/invoicing/invoices", self.base_url);
        let request = self
            .http_client
            .get(&url)
            .headers(Self::bearer_headers(token)?)
            .query(&[
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
                ("total_required", "true".to_string()),
            ]);

        Self::read_json(request).await
    }

    /// GET /v2/invoicing/invoices/{invoice_id}
    pub async fn get_invoice(&self, token: &str, invoice_id: &str) -> Result<InvoiceResource, ApiError> {
        let url = self.invoice_url(invoice_id, None)?;
        let request = self
            .http_client
            .get(url)
            .headers(Self::bearer_headers(token)?);

        Self::read_json(request).await
    }

    /// POST /v2/invoicing/invoices/{invoice_id}/send
    ///
    /// With `send_to_recipient = false` PayPal only generates the payer link
    /// and sends no email.
    pub async fn send_invoice(
        &self,
        token: &str,
        invoice_id: &str,
        send_to_recipient: bool,
    ) -> Result<(), ApiError> {
        let url = self.invoice_url(invoice_id, Some("send"))?;
        let request = self
            .http_client
            .post(url)
            .headers(Self::bearer_headers(token)?)
            .json(&SendInvoiceRequest { send_to_recipient });

        Self::send(request).await?;
        Ok(())
    }
}
