//! OAuth access token model

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// How a token was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Client-credentials grant; acts as the app itself
    App,
    /// Authorization-code or refresh grant; acts for a signed-in user
    User,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::App => "app",
            TokenKind::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "app" => Some(TokenKind::App),
            "user" => Some(TokenKind::User),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A PayPal OAuth access token and its lifetime
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// App the token was issued to
    pub client_id: String,
    pub kind: TokenKind,
    pub value: String,
    pub scope: Option<String>,
    pub token_type: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: Option<String>,
}

impl AccessToken {
    /// Usable for a request starting at `now` that may take up to `leeway`
    pub fn is_fresh_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        now + leeway < self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Remaining lifetime, zero once expired
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("client_id", &self.client_id)
            .field("kind", &self.kind)
            .field("value", &"<redacted>")
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}
