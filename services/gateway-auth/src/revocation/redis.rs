//! Redis revocation backend

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use super::{KeyScheme, RevocationStore};
use crate::error::StoreError;

/// Redis-backed blacklist. `ConnectionManager` is cheap to clone and
/// multiplexes concurrent commands, so each call works on its own clone.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    keys: KeyScheme,
}

impl RedisRevocationStore {
    /// Opens a managed connection to `redis_url`
    pub async fn connect(redis_url: &str, keys: KeyScheme) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, keys })
    }

    /// Wraps an existing connection
    pub fn from_connection(conn: ConnectionManager, keys: KeyScheme) -> Self {
        Self { conn, keys }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn is_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(self.keys.key_for(token)).await?;
        Ok(exists)
    }

    async fn blacklist(&self, token: &str, ttl: Duration) -> Result<(), StoreError> {
        let secs = ttl.as_secs();
        if secs == 0 {
            debug!("Skipping blacklist entry for already expired token");
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.keys.key_for(token), "1", secs)
            .await?;
        Ok(())
    }
}
