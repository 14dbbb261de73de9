//! Circuit Breaker State Management
//!
//! Consecutive failures open the circuit. After the cool-down a single
//! probe call is let through; its outcome closes or re-opens the circuit.

use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow through
    Closed,
    /// Calls fail fast
    Open,
    /// One probe call decides whether to close again
    HalfOpen,
}

impl CircuitState {
    /// Label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Mutable breaker state, guarded by the breaker's mutex.
#[derive(Debug)]
pub struct CircuitBreakerState {
    /// Current state
    pub state: CircuitState,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// When the circuit last opened
    pub opened_at: Option<Instant>,
    /// Start of the half-open probe still in flight
    pub probe_started: Option<Instant>,
}

impl CircuitBreakerState {
    /// Closed, with no failures recorded
    pub fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_started: None,
        }
    }

    /// Whether a call may proceed. Moves Open to HalfOpen once `cool_down`
    /// has elapsed and admits one probe; further calls fail fast until the
    /// probe settles. A probe that never reported back is replaced after
    /// another `cool_down`.
    pub fn allow(&mut self, cool_down: Duration, name: &str) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => self.start_probe(cool_down),
            CircuitState::Open => {
                let elapsed = self.opened_at.is_some_and(|at| at.elapsed() >= cool_down);
                if !elapsed {
                    return false;
                }
                self.state = CircuitState::HalfOpen;
                self.probe_started = None;
                info!(circuit = %name, "Circuit transitioning to half-open");
                self.start_probe(cool_down)
            }
        }
    }

    fn start_probe(&mut self, cool_down: Duration) -> bool {
        let free = self
            .probe_started
            .map_or(true, |started| started.elapsed() >= cool_down);
        if free {
            self.probe_started = Some(Instant::now());
        }
        free
    }

    /// Closes the circuit
    pub fn record_success(&mut self, name: &str) {
        if self.state == CircuitState::HalfOpen {
            info!(circuit = %name, "Circuit closed after recovery");
        }
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
        self.probe_started = None;
    }

    /// Counts a failure; trips at `threshold` or on a failed probe
    pub fn record_failure(&mut self, threshold: u32, name: &str) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.probe_started = None;
        let trip = match self.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => self.consecutive_failures >= threshold,
            CircuitState::Open => false,
        };
        if trip {
            self.state = CircuitState::Open;
            self.opened_at = Some(Instant::now());
            warn!(
                circuit = %name,
                failures = self.consecutive_failures,
                "Circuit opened due to failures"
            );
        }
    }

    /// Time until an open circuit half-opens, or until a pending probe
    /// may be replaced
    pub fn retry_after(&self, cool_down: Duration) -> Duration {
        self.probe_started
            .or(self.opened_at)
            .map(|at| cool_down.saturating_sub(at.elapsed()))
            .unwrap_or(cool_down)
    }
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self::new()
    }
}
