//! Prometheus metrics for authentication decisions.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Decision counters and revocation lookup latency.
pub struct GatewayMetrics {
    registry: Registry,
    /// Decisions by outcome label
    pub decisions: IntCounterVec,
    /// Revocation store lookup latency in seconds
    pub lookup_latency: Histogram,
}

impl GatewayMetrics {
    /// Creates metrics on a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new("decisions_total", "Authentication decisions by outcome")
                .namespace("gateway_auth"),
            &["outcome"],
        )?;
        registry.register(Box::new(decisions.clone()))?;

        let lookup_latency = Histogram::with_opts(
            HistogramOpts::new(
                "revocation_lookup_seconds",
                "Revocation store lookup latency",
            )
            .namespace("gateway_auth")
            .buckets(vec![0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )?;
        registry.register(Box::new(lookup_latency.clone()))?;

        Ok(Self {
            registry,
            decisions,
            lookup_latency,
        })
    }

    /// Counts one decision
    pub fn record_decision(&self, outcome: &str) {
        self.decisions.with_label_values(&[outcome]).inc();
    }

    /// Records a lookup duration
    pub fn observe_lookup(&self, seconds: f64) {
        self.lookup_latency.observe(seconds);
    }

    /// Current count for an outcome label
    pub fn decision_count(&self, outcome: &str) -> u64 {
        self.decisions.with_label_values(&[outcome]).get()
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
