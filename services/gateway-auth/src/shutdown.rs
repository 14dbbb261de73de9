//! Graceful Shutdown
//!
//! Serves until SIGINT/SIGTERM, then gives in-flight requests a bounded
//! drain period.

use std::future::IntoFuture;
use std::io;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Runs the server with graceful shutdown support
pub async fn serve_with_graceful_shutdown(
    listener: TcpListener,
    app: Router,
    drain_timeout: Duration,
) -> io::Result<()> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut server => {
            return flatten(result);
        }
        _ = wait_for_signal() => {}
    }

    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(drain_timeout, &mut server).await {
        Ok(result) => {
            info!("All connections drained");
            flatten(result)
        }
        Err(_) => {
            warn!("Shutdown timeout reached, aborting remaining connections");
            server.abort();
            Ok(())
        }
    }
}

fn flatten(result: Result<io::Result<()>, tokio::task::JoinError>) -> io::Result<()> {
    match result {
        Ok(inner) => inner,
        Err(join_error) => Err(io::Error::other(join_error)),
    }
}
