//! Wiring: store selection and router assembly.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::bypass::BypassMatcher;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::{Config, StoreBackend};
use crate::error::StoreError;
use crate::filter::{AuthFilter, AuthLayer};
use crate::jwt::TokenValidator;
use crate::observability::GatewayMetrics;
use crate::revocation::{
    GuardedStore, InMemoryRevocationStore, KeyScheme, RedisRevocationStore, RevocationStore,
};

/// Connect the configured revocation backend, bounded by timeout and
/// circuit breaker.
pub async fn build_store(config: &Config) -> Result<Arc<dyn RevocationStore>, StoreError> {
    let settings = &config.revocation;
    let keys = KeyScheme::new(settings.key_prefix.clone(), settings.hash_keys);

    let inner: Arc<dyn RevocationStore> = match settings.backend {
        StoreBackend::Redis => {
            info!("Connecting to Redis revocation store");
            Arc::new(RedisRevocationStore::connect(&settings.redis_url, keys).await?)
        }
        StoreBackend::Memory => {
            info!("Using in-memory revocation store");
            Arc::new(InMemoryRevocationStore::new(keys))
        }
    };

    Ok(Arc::new(GuardedStore::new(
        inner,
        settings.lookup_timeout,
        CircuitBreaker::new(
            "revocation-store",
            settings.failure_threshold,
            settings.circuit_timeout,
        ),
    )))
}

/// Build the filter from configuration and an already connected store.
pub fn build_filter(
    config: &Config,
    store: Arc<dyn RevocationStore>,
    metrics: Arc<GatewayMetrics>,
) -> AuthFilter {
    AuthFilter::new(
        BypassMatcher::new(config.bypass_rules.clone(), config.bypass_mode),
        store,
        TokenValidator::from_settings(&config.jwt),
    )
    .with_metrics(metrics)
}

/// Gateway router: `downstream` behind the auth layer, `/health` and
/// `/metrics` served by the gate itself.
pub fn router(filter: Arc<AuthFilter>, downstream: Router, metrics: Arc<GatewayMetrics>) -> Router {
    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(metrics);

    downstream
        .layer(AuthLayer::new(filter))
        .merge(ops)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "OK"
}

async fn render_metrics(State(metrics): State<Arc<GatewayMetrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}
