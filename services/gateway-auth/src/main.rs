//! Gateway Auth - Main Entry Point

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use gateway_auth::app::{build_filter, build_store, router};
use gateway_auth::forward::Forwarder;
use gateway_auth::observability::{init_tracing, GatewayMetrics, TracingConfig};
use gateway_auth::shutdown::serve_with_graceful_shutdown;
use gateway_auth::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    init_tracing(&TracingConfig::from_config(&config)).context("installing tracing")?;

    info!(
        bypass_mode = ?config.bypass_mode,
        upstream = %config.upstream_url,
        "Starting Gateway Auth"
    );

    let metrics = Arc::new(GatewayMetrics::new().context("registering metrics")?);
    let store = build_store(&config)
        .await
        .context("connecting revocation store")?;
    let filter = Arc::new(build_filter(&config, store, metrics.clone()));

    let forwarder = Forwarder::new(config.upstream_url.clone(), config.request_timeout())
        .context("building upstream client")?;
    let app = router(filter, forwarder.into_router(), metrics);

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("binding {}", config.listen_addr()))?;
    info!("Gateway Auth listening on {}", config.listen_addr());

    serve_with_graceful_shutdown(
        listener,
        app,
        Duration::from_secs(config.shutdown_timeout_seconds),
    )
    .await?;

    info!("Gateway Auth stopped");
    Ok(())
}
