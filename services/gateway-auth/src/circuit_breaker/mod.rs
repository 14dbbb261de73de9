//! Circuit breaker for the revocation store
//!
//! Once the store has failed `failure_threshold` times in a row, lookups
//! fail fast for `cool_down`. Failing fast still denies the request: the
//! breaker only saves the caller from waiting on a dead dependency.

mod state;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

pub use state::{CircuitBreakerState, CircuitState};

/// Error type for circuit breaker protected calls
#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, the call was not attempted
    Open {
        /// Time until a call may be attempted again
        retry_after: Duration,
    },
    /// The protected call failed
    Inner(E),
}

/// Async-safe circuit breaker with shared state.
#[derive(Clone)]
pub struct CircuitBreaker {
    name: String,
    state: Arc<Mutex<CircuitBreakerState>>,
    failure_threshold: u32,
    cool_down: Duration,
}

impl CircuitBreaker {
    /// Creates a new circuit breaker
    pub fn new(name: impl Into<String>, failure_threshold: u32, cool_down: Duration) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(CircuitBreakerState::new())),
            failure_threshold: failure_threshold.max(1),
            cool_down,
        }
    }

    /// Returns the circuit breaker name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the current circuit state
    pub async fn state(&self) -> CircuitState {
        self.state.lock().await.state
    }

    /// Runs `f` unless the circuit is open, recording its outcome
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        {
            let mut state = self.state.lock().await;
            if !state.allow(self.cool_down, &self.name) {
                return Err(CircuitBreakerError::Open {
                    retry_after: state.retry_after(self.cool_down),
                });
            }
        }

        let result = f.await;

        let mut state = self.state.lock().await;
        match result {
            Ok(value) => {
                state.record_success(&self.name);
                Ok(value)
            }
            Err(err) => {
                state.record_failure(self.failure_threshold, &self.name);
                Err(CircuitBreakerError::Inner(err))
            }
        }
    }
}
