//! JWT Validator over a shared HMAC secret
//!
//! Wraps the type-state token so callers get either checked claims or a
//! typed failure, with expiry reported separately from everything else.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey};

use crate::config::JwtSettings;
use crate::error::ValidationError;
use crate::jwt::claims::Claims;
use crate::jwt::token::{Token, Unvalidated, Validated};

/// Verifies signature then expiry of bearer tokens.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    algorithm: Algorithm,
    leeway_secs: u64,
}

impl TokenValidator {
    /// Creates a validator from raw secret bytes
    pub fn from_secret(secret: &[u8], algorithm: Algorithm, leeway_secs: u64) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            algorithm,
            leeway_secs,
        }
    }

    /// Creates a validator from configuration
    pub fn from_settings(settings: &JwtSettings) -> Self {
        Self::from_secret(
            settings.secret.as_bytes(),
            settings.algorithm,
            settings.leeway_secs,
        )
    }

    /// Validates against the current wall clock
    pub fn validate(&self, raw_token: &str) -> Result<Claims, ValidationError> {
        self.validate_at(raw_token, Utc::now().timestamp())
            .map(Token::into_claims)
    }

    /// Validates against an explicit `now` (unix seconds)
    pub fn validate_at(
        &self,
        raw_token: &str,
        now: i64,
    ) -> Result<Token<Validated>, ValidationError> {
        Token::<Unvalidated>::parse(raw_token)?
            .validate_signature(&self.key, self.algorithm)?
            .validate_claims(now, self.leeway_secs)
    }

    /// TTL for a blacklist entry created now
    pub fn remaining_lifetime(&self, claims: &Claims) -> Duration {
        claims.remaining_lifetime(Utc::now().timestamp())
    }

    /// Configured clock skew tolerance
    pub fn leeway_secs(&self) -> u64 {
        self.leeway_secs
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}
