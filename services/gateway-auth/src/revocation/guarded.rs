//! Timeout and circuit breaker around a revocation backend

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::warn;

use super::RevocationStore;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerError};
use crate::error::StoreError;

/// Bounds every call to the inner store with a timeout and a circuit
/// breaker. Timeouts count as failures.
#[derive(Clone)]
pub struct GuardedStore {
    inner: Arc<dyn RevocationStore>,
    lookup_timeout: Duration,
    breaker: CircuitBreaker,
}

impl GuardedStore {
    /// Wraps `inner` with a per-call timeout and the given breaker
    pub fn new(
        inner: Arc<dyn RevocationStore>,
        lookup_timeout: Duration,
        breaker: CircuitBreaker,
    ) -> Self {
        Self {
            inner,
            lookup_timeout,
            breaker,
        }
    }

    /// Breaker guarding the inner store
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn guarded<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, StoreError>>,
    {
        let budget = self.lookup_timeout;
        let bounded = async move {
            match timeout(budget, f).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(budget)),
            }
        };

        match self.breaker.call(bounded).await {
            Ok(value) => Ok(value),
            Err(CircuitBreakerError::Open { retry_after }) => {
                Err(StoreError::CircuitOpen { retry_after })
            }
            Err(CircuitBreakerError::Inner(err)) => {
                warn!(operation = op, error = %err, "Revocation store call failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl RevocationStore for GuardedStore {
    async fn is_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        self.guarded("is_blacklisted", self.inner.is_blacklisted(token))
            .await
    }

    async fn blacklist(&self, token: &str, ttl: Duration) -> Result<(), StoreError> {
        self.guarded("blacklist", self.inner.blacklist(token, ttl)).await
    }
}
