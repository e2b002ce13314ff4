//! Error types for the token, fetch, storage and CLI layers

use thiserror::Error;

use crate::api::paypal::ApiError;
use crate::utils::CryptoError;

/// Token store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Token encryption error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Corrupt stored token: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// The OAuth call failed or returned no access token
    #[error("PayPal authentication failed: {0}")]
    Auth(String),
    /// Nothing usable cached and issuance is disabled; re-authenticate
    #[error("No valid access token available")]
    NoValidToken,
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ApiError> for TokenError {
    fn from(err: ApiError) -> Self {
        TokenError::Auth(err.to_string())
    }
}

/// Failure of a data-endpoint call (reporting or invoicing)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{endpoint} failed: {source}")]
    Api {
        endpoint: &'static str,
        #[source]
        source: ApiError,
    },
    #[error("Invalid time range: {0}")]
    InvalidRange(String),
}

impl FetchError {
    pub fn api(endpoint: &'static str) -> impl FnOnce(ApiError) -> FetchError {
        move |source| FetchError::Api { endpoint, source }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set in environment or .env file")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error for the command line
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Usage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_endpoint() {
        let err = FetchError::api("GET /v1/reporting/transactions")(ApiError::ServerError(
            503,
            "SERVICE_UNAVAILABLE".into(),
        ));
        assert_eq!(
            err.to_string(),
            "GET /v1/reporting/transactions failed: Server Error (503): SERVICE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_api_error_becomes_auth() {
        let err: TokenError = ApiError::Unauthorized("invalid_client".into()).into();
        assert!(matches!(err, TokenError::Auth(ref m) if m.contains("invalid_client")));
    }
}
