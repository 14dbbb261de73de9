//! In-memory revocation backend

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyScheme, RevocationStore};
use crate::error::StoreError;

/// Process-local blacklist for development and tests. Entries are not
/// shared between gateway instances and do not survive a restart. Expired
/// entries are dropped whenever a token is revoked.
#[derive(Clone, Default)]
pub struct InMemoryRevocationStore {
    entries: Arc<RwLock<HashMap<String, Instant>>>,
    keys: KeyScheme,
}

impl InMemoryRevocationStore {
    /// Empty store using `keys`
    pub fn new(keys: KeyScheme) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            keys,
        }
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }

    /// True when no live entries remain
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired entries
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.write().await.retain(|_, expires_at| *expires_at > now);
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn is_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        let key = self.keys.key_for(token);
        let entries = self.entries.read().await;
        Ok(entries
            .get(&key)
            .is_some_and(|expires_at| *expires_at > Instant::now()))
    }

    async fn blacklist(&self, token: &str, ttl: Duration) -> Result<(), StoreError> {
        if ttl.is_zero() {
            return Ok(());
        }
        let key = self.keys.key_for(token);
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expires_at| *expires_at > now);
        entries.insert(key, now + ttl);
        Ok(())
    }
}
