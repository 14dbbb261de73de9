//! Revocation store: the blacklist of logged-out tokens
//!
//! The gate only reads from the store; `blacklist` is the write half used by
//! the logout flow. Entries live exactly as long as the token they revoke.

mod guarded;
mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::StoreError;

pub use guarded::GuardedStore;
pub use memory::InMemoryRevocationStore;
pub use self::redis::RedisRevocationStore;

/// Blacklist lookups and inserts. Implementations must be safe to call
/// concurrently without caller-side locking.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// True when the token has been revoked
    async fn is_blacklisted(&self, token: &str) -> Result<bool, StoreError>;

    /// Revoke the token for `ttl`. A zero TTL is a no-op.
    async fn blacklist(&self, token: &str, ttl: Duration) -> Result<(), StoreError>;
}

/// How tokens are turned into store keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    prefix: String,
    hash: bool,
}

impl KeyScheme {
    /// Creates a key scheme
    pub fn new(prefix: impl Into<String>, hash: bool) -> Self {
        Self {
            prefix: prefix.into(),
            hash,
        }
    }

    /// Store key for a token
    pub fn key_for(&self, token: &str) -> String {
        if self.hash {
            format!("{}{:x}", self.prefix, Sha256::digest(token.as_bytes()))
        } else {
            format!("{}{}", self.prefix, token)
        }
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self::new("blacklist:", true)
    }
}
