//! Authentication filter
//!
//! Per request: path check, bypass check, token extraction, revocation
//! lookup, token validation. Each step can end the evaluation; exactly one
//! decision comes out and nothing is retried here.

mod layer;

use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderMap;
use tracing::{debug, info, warn};

use crate::bypass::BypassMatcher;
use crate::error::AuthRejection;
use crate::extract::extract_bearer;
use crate::identity::AuthenticatedIdentity;
use crate::jwt::TokenValidator;
use crate::observability::GatewayMetrics;
use crate::path;
use crate::revocation::RevocationStore;

pub use layer::{AuthLayer, AuthService};

/// Outcome of a request that may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// Path is exempt; forwarded without identity
    Bypassed {
        /// Name of the matching bypass group
        rule: String,
    },
    /// Token checked; forwarded with identity
    Authenticated(AuthenticatedIdentity),
}

impl AuthDecision {
    /// Metric label for this decision
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::Bypassed { .. } => "bypassed",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

/// Stateless orchestrator, shared across concurrent requests.
pub struct AuthFilter {
    bypass: BypassMatcher,
    store: Arc<dyn RevocationStore>,
    validator: TokenValidator,
    metrics: Option<Arc<GatewayMetrics>>,
}

impl AuthFilter {
    /// Creates a filter from its collaborators
    pub fn new(
        bypass: BypassMatcher,
        store: Arc<dyn RevocationStore>,
        validator: TokenValidator,
    ) -> Self {
        Self {
            bypass,
            store,
            validator,
            metrics: None,
        }
    }

    /// Record decisions and lookup latency
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Decide whether a request with this path and headers may proceed.
    pub async fn evaluate(
        &self,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<AuthDecision, AuthRejection> {
        let result = self.decide(path, headers).await;

        let label = match &result {
            Ok(decision) => decision.metric_label(),
            Err(rejection) => rejection.code().metric_label(),
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_decision(label);
        }

        match &result {
            Ok(AuthDecision::Bypassed { rule }) => {
                debug!(path, rule = %rule, "Authentication bypassed");
            }
            Ok(AuthDecision::Authenticated(identity)) => {
                debug!(path, subject = %identity.subject, "Request authenticated");
            }
            Err(AuthRejection::TokenExpired { expired_at }) => {
                info!(path, expired_at = %expired_at, "Rejected expired token");
            }
            Err(AuthRejection::DependencyUnavailable { service, .. }) => {
                warn!(path, service, "Rejected: dependency unavailable");
            }
            Err(rejection) => {
                info!(path, code = rejection.code().as_str(), "Request rejected");
            }
        }

        result
    }

    async fn decide(
        &self,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<AuthDecision, AuthRejection> {
        if !path::is_canonical(path) {
            return Err(AuthRejection::InvalidPath);
        }

        if let Some(rule) = self.bypass.matching_rule(path) {
            return Ok(AuthDecision::Bypassed {
                rule: rule.to_string(),
            });
        }

        let token = extract_bearer(headers).ok_or(AuthRejection::Unauthenticated)?;

        let started = Instant::now();
        let revoked = self.store.is_blacklisted(token).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_lookup(started.elapsed().as_secs_f64());
        }
        if revoked? {
            return Err(AuthRejection::TokenRevoked);
        }

        let claims = self.validator.validate(token)?;
        Ok(AuthDecision::Authenticated(
            AuthenticatedIdentity::from_claims(&claims),
        ))
    }
}
