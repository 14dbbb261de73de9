//! Token claims

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access tokens authenticate requests; refresh tokens only mint new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Presented on every request
    Access,
    /// Exchanged for a new access token
    Refresh,
}

/// Registered and private claims read from an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at, unix seconds
    #[serde(default)]
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
    /// Role granted to the subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Access or refresh; absent means access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenKind>,
    /// Any other claims
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Claims for `sub` valid from `iat` until `exp`
    pub fn new(sub: impl Into<String>, iat: i64, exp: i64) -> Self {
        Self {
            sub: sub.into(),
            iat,
            exp,
            role: None,
            token_type: None,
            custom: HashMap::new(),
        }
    }

    /// Sets the role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sets the token kind
    pub fn with_kind(mut self, kind: TokenKind) -> Self {
        self.token_type = Some(kind);
        self
    }

    /// Expired once `now` is past `exp + leeway`.
    pub fn is_expired_at(&self, now: i64, leeway_secs: u64) -> bool {
        let leeway = i64::try_from(leeway_secs).unwrap_or(i64::MAX);
        self.exp.saturating_add(leeway) < now
    }

    /// Untyped tokens are treated as access tokens.
    pub fn kind(&self) -> TokenKind {
        self.token_type.unwrap_or(TokenKind::Access)
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Time left before expiry, zero when already past it. This is the
    /// lifetime of a blacklist entry created at `now`.
    pub fn remaining_lifetime(&self, now: i64) -> Duration {
        u64::try_from(self.exp.saturating_sub(now))
            .map(Duration::from_secs)
            .unwrap_or(Duration::ZERO)
    }
}
