use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::mysql::MySqlPool;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::{AccessToken, TokenKind};
use crate::utils::SecretKey;

/// Persistence for issued access tokens.
///
/// Lookups only see tokens issued to `client_id` through grants of `kind`,
/// so several apps and the app/user flows can share one store.
#[allow(async_fn_in_trait)]
pub trait TokenStore {
    /// Record a newly issued token
    async fn save(&self, token: &AccessToken) -> Result<(), StoreError>;

    /// The token expiring last among those still valid after `valid_after`
    /// (ties go to the most recently issued)
    async fn latest_valid(
        &self,
        client_id: &str,
        kind: TokenKind,
        valid_after: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, StoreError>;

    /// The token expiring last, expired or not
    async fn latest_any(
        &self,
        client_id: &str,
        kind: TokenKind,
    ) -> Result<Option<AccessToken>, StoreError>;
}

impl<T: TokenStore> TokenStore for Arc<T> {
    async fn save(&self, token: &AccessToken) -> Result<(), StoreError> {
        self.as_ref().save(token).await
    }

    async fn latest_valid(
        &self,
        client_id: &str,
        kind: TokenKind,
        valid_after: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, StoreError> {
        self.as_ref().latest_valid(client_id, kind, valid_after).await
    }

    async fn latest_any(
        &self,
        client_id: &str,
        kind: TokenKind,
    ) -> Result<Option<AccessToken>, StoreError> {
        self.as_ref().latest_any(client_id, kind).await
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Vec<AccessToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.tokens.lock().await.len()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn save(&self, token: &AccessToken) -> Result<(), StoreError> {
        self.tokens.lock().await.push(token.clone());
        Ok(())
    }

    async fn latest_valid(
        &self,
        client_id: &str,
        kind: TokenKind,
        valid_after: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, StoreError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens
            .iter()
            .filter(|t| t.client_id == client_id && t.kind == kind)
            .filter(|t| t.expires_at > valid_after)
            .max_by_key(|t| (t.expires_at, t.issued_at))
            .cloned())
    }

    async fn latest_any(
        &self,
        client_id: &str,
        kind: TokenKind,
    ) -> Result<Option<AccessToken>, StoreError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens
            .iter()
            .filter(|t| t.client_id == client_id && t.kind == kind)
            .max_by_key(|t| (t.expires_at, t.issued_at))
            .cloned())
    }
}

type TokenRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    bool,
    NaiveDateTime,
    NaiveDateTime,
);

const SELECT_TOKEN: &str = "SELECT client_id, kind, access_token, token_type, scope, refresh_token, encrypted, issued_at, expires_at FROM paypal_token WHERE client_id = ? AND kind = ?";

/// Tokens in the `paypal_token` table, sealed with `key` when one is configured
#[derive(Debug, Clone)]
pub struct MySqlTokenStore {
    pool: MySqlPool,
    key: Option<SecretKey>,
}

impl MySqlTokenStore {
    pub fn new(pool: MySqlPool, key: Option<SecretKey>) -> Self {
        Self { pool, key }
    }

    fn seal(&self, secret: &str) -> Result<String, StoreError> {
        match &self.key {
            Some(key) => Ok(key.seal(secret)?),
            None => Ok(secret.to_string()),
        }
    }

    fn open(&self, stored: String, encrypted: bool) -> Result<String, StoreError> {
        if !encrypted {
            return Ok(stored);
        }
        match &self.key {
            Some(key) => Ok(key.open(&stored)?),
            None => Err(StoreError::Corrupt(
                "token is encrypted but TOKEN_ENCRYPTION_KEY is not set".to_string(),
            )),
        }
    }

    fn decode_row(&self, row: TokenRow) -> Result<AccessToken, StoreError> {
        let (client_id, kind, value, token_type, scope, refresh_token, encrypted, issued_at, expires_at) =
            row;

        let kind = TokenKind::parse(&kind)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown token kind '{}'", kind)))?;

        Ok(AccessToken {
            client_id,
            kind,
            value: self.open(value, encrypted)?,
            scope,
            token_type,
            issued_at: Utc.from_utc_datetime(&issued_at),
            expires_at: Utc.from_utc_datetime(&expires_at),
            refresh_token: refresh_token
                .map(|r| self.open(r, encrypted))
                .transpose()?,
        })
    }
}

impl TokenStore for MySqlTokenStore {
    async fn save(&self, token: &AccessToken) -> Result<(), StoreError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .map(|r| self.seal(r))
            .transpose()?;

        sqlx::query(
            "INSERT INTO paypal_token (client_id, kind, access_token, token_type, scope, refresh_token, encrypted, issued_at, expires_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&token.client_id)
        .bind(token.kind.as_str())
        .bind(self.seal(&token.value)?)
        .bind(&token.token_type)
        .bind(&token.scope)
        .bind(refresh_token)
        .bind(self.key.is_some())
        .bind(token.issued_at.naive_utc())
        .bind(token.expires_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_valid(
        &self,
        client_id: &str,
        kind: TokenKind,
        valid_after: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "{} AND expires_at > ? ORDER BY expires_at DESC, issued_at DESC, id DESC LIMIT 1",
            SELECT_TOKEN
        ))
        .bind(client_id)
        .bind(kind.as_str())
        .bind(valid_after.naive_utc())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| self.decode_row(r)).transpose()
    }

    async fn latest_any(
        &self,
        client_id: &str,
        kind: TokenKind,
    ) -> Result<Option<AccessToken>, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "{} ORDER BY expires_at DESC, issued_at DESC, id DESC LIMIT 1",
            SELECT_TOKEN
        ))
        .bind(client_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| self.decode_row(r)).transpose()
    }
}

/// Store chosen at startup: MySQL when `DATABASE_URL` is set, memory otherwise
#[derive(Debug)]
pub enum AnyTokenStore {
    MySql(MySqlTokenStore),
    Memory(MemoryTokenStore),
}

impl TokenStore for AnyTokenStore {
    async fn save(&self, token: &AccessToken) -> Result<(), StoreError> {
        match self {
            AnyTokenStore::MySql(store) => store.save(token).await,
            AnyTokenStore::Memory(store) => store.save(token).await,
        }
    }

    async fn latest_valid(
        &self,
        client_id: &str,
        kind: TokenKind,
        valid_after: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, StoreError> {
        match self {
            AnyTokenStore::MySql(store) => store.latest_valid(client_id, kind, valid_after).await,
            AnyTokenStore::Memory(store) => store.latest_valid(client_id, kind, valid_after).await,
        }
    }

    async fn latest_any(
        &self,
        client_id: &str,
        kind: TokenKind,
    ) -> Result<Option<AccessToken>, StoreError> {
        match self {
            AnyTokenStore::MySql(store) => store.latest_any(client_id, kind).await,
            AnyTokenStore::Memory(store) => store.latest_any(client_id, kind).await,
        }
    }
}
