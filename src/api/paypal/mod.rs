pub mod client;
pub mod models;

pub use client::PayPalClient;
pub use models::{ApiError, ClientCredentials, GrantType, TokenResponse};
