//! Environment configuration

use std::time::Duration;

use crate::api::paypal::{ClientCredentials, PayPalClient};
use crate::error::ConfigError;
use crate::utils::SecretKey;

pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 40;
pub const DEFAULT_OAUTH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_LEEWAY_SECS: i64 = 60;
pub const MAX_LEEWAY_SECS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: ClientCredentials,
    pub base_url: String,
    /// Without a database, tokens only live for the process
    pub database_url: Option<String>,
    pub encryption_key: Option<SecretKey>,
    pub page_size: u32,
    pub timeout: Duration,
    pub oauth_timeout: Duration,
    pub token_leeway: chrono::Duration,
    pub auto_issue: bool,
    pub allow_expired_fallback: bool,
}

impl Config {
    /// Read configuration from the process environment (after `dotenv`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `DATABASE_URL` alone, for commands that never call PayPal
    pub fn database_url_from_env() -> Result<String, ConfigError> {
        Self::database_url_from_lookup(|name| std::env::var(name).ok())
    }

    pub fn database_url_from_lookup<F>(lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        non_empty(&lookup, "DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| non_empty(&lookup, name);
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let credentials =
            ClientCredentials::new(required("PAYPAL_CLIENT_ID")?, required("PAYPAL_CLIENT_SECRET")?);

        let base_url = match get("PAYPAL_BASE") {
            Some(base) => base,
            None => match get("PAYPAL_ENV").as_deref().map(str::to_ascii_lowercase).as_deref() {
                None | Some("sandbox") => PayPalClient::SANDBOX_BASE_URL.to_string(),
                Some("live") | Some("production") => PayPalClient::LIVE_BASE_URL.to_string(),
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        name: "PAYPAL_ENV",
                        reason: format!("expected 'sandbox' or 'live', got '{}'", other),
                    })
                }
            },
        };

        let encryption_key = get("TOKEN_ENCRYPTION_KEY")
            .map(|hex| SecretKey::from_hex(&hex))
            .transpose()
            .map_err(|e| ConfigError::Invalid {
                name: "TOKEN_ENCRYPTION_KEY",
                reason: e.to_string(),
            })?;

        let page_size = parse_number(get("PAYPAL_PAGE_SIZE"), "PAYPAL_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "PAYPAL_PAGE_SIZE",
                reason: "must be at least 1".to_string(),
            });
        }

        let leeway_secs = parse_number(get("TOKEN_LEEWAY_SECS"), "TOKEN_LEEWAY_SECS", DEFAULT_LEEWAY_SECS)?;
        if !(0..=MAX_LEEWAY_SECS).contains(&leeway_secs) {
            return Err(ConfigError::Invalid {
                name: "TOKEN_LEEWAY_SECS",
                reason: format!("must be between 0 and {}", MAX_LEEWAY_SECS),
            });
        }

        Ok(Self {
            credentials,
            base_url,
            database_url: get("DATABASE_URL"),
            encryption_key,
            page_size,
            timeout: Duration::from_secs(parse_number(
                get("PAYPAL_TIMEOUT_SECS"),
                "PAYPAL_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            oauth_timeout: Duration::from_secs(parse_number(
                get("PAYPAL_OAUTH_TIMEOUT_SECS"),
                "PAYPAL_OAUTH_TIMEOUT_SECS",
                DEFAULT_OAUTH_TIMEOUT_SECS,
            )?),
            token_leeway: chrono::Duration::seconds(leeway_secs),
            auto_issue: parse_flag(get("TOKEN_AUTO_ISSUE"), "TOKEN_AUTO_ISSUE", true)?,
            allow_expired_fallback: parse_flag(
                get("TOKEN_ALLOW_EXPIRED_FALLBACK"),
                "TOKEN_ALLOW_EXPIRED_FALLBACK",
                false,
            )?,
        })
    }
}

/// Trimmed value of `name`; blank counts as unset
fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_number<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: format!("'{}': {}", v, e),
        }),
    }
}

fn parse_flag(value: Option<String>, name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "y" | "on") => Ok(true),
        Some("0" | "false" | "no" | "n" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            name,
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("PAYPAL_CLIENT_ID", "id"), ("PAYPAL_CLIENT_SECRET", "secret")])
            .unwrap();

        assert_eq!(config.base_url, PayPalClient::SANDBOX_BASE_URL);
        assert_eq!(config.page_size, 500);
        assert_eq!(config.timeout, Duration::from_secs(40));
        assert_eq!(config.oauth_timeout, Duration::from_secs(20));
        assert_eq!(config.token_leeway, chrono::Duration::seconds(60));
        assert!(config.auto_issue);
        assert!(!config.allow_expired_fallback);
        assert!(config.database_url.is_none());
        assert!(config.encryption_key.is_none());
    }

    #[test]
    fn test_missing_secret() {
        let err = config_from(&[("PAYPAL_CLIENT_ID", "id")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PAYPAL_CLIENT_SECRET")));
    }

    #[test]
    fn test_overrides() {
        let key = "ab".repeat(32);
        let config = config_from(&[
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_ENV", "LIVE"),
            ("PAYPAL_PAGE_SIZE", "100"),
            ("TOKEN_AUTO_ISSUE", "no"),
            ("TOKEN_ALLOW_EXPIRED_FALLBACK", "1"),
            ("TOKEN_ENCRYPTION_KEY", key.as_str()),
        ])
        .unwrap();

        assert_eq!(config.base_url, PayPalClient::LIVE_BASE_URL);
        assert_eq!(config.page_size, 100);
        assert!(!config.auto_issue);
        assert!(config.allow_expired_fallback);
        assert!(config.encryption_key.is_some());

        let explicit = config_from(&[
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_BASE", "http://127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(explicit.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_database_url_alone() {
        let lookup = |value: &'static str| move |name: &str| (name == "DATABASE_URL").then(|| value.to_string());

        assert_eq!(
            Config::database_url_from_lookup(lookup("  mysql://u:p@localhost/paysync \n")).unwrap(),
            "mysql://u:p@localhost/paysync"
        );
        assert!(matches!(
            Config::database_url_from_lookup(lookup("   ")),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        assert!(matches!(
            Config::database_url_from_lookup(|_: &str| None),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let base = [("PAYPAL_CLIENT_ID", "id"), ("PAYPAL_CLIENT_SECRET", "secret")];

        for bad in [
            ("PAYPAL_ENV", "staging"),
            ("PAYPAL_PAGE_SIZE", "0"),
            ("PAYPAL_TIMEOUT_SECS", "forty"),
            ("TOKEN_AUTO_ISSUE", "maybe"),
            ("TOKEN_LEEWAY_SECS", "9223372036854775807"),
            ("TOKEN_LEEWAY_SECS", "-1"),
            ("TOKEN_ENCRYPTION_KEY", "abcd"),
        ] {
            let mut pairs = base.to_vec();
            pairs.push(bad);
            assert!(
                matches!(config_from(&pairs), Err(ConfigError::Invalid { .. })),
                "{} should be rejected",
                bad.0
            );
        }
    }
}
