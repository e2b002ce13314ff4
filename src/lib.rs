//! PayPal synchronization: OAuth token caching, windowed transaction
//! fetching, invoice pay links and recurring-charge detection.

pub mod api;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, ConfigError, ExportError, FetchError, StoreError, TokenError};
