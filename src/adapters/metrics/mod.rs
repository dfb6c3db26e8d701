//! Metrics and Monitoring Adapters
//!
//! Provides Prometheus metrics (`/metrics`) and health probes
//! (`/live`, `/ready`) on a single axum server.

pub mod health;
pub mod prometheus;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, instrument};

pub use health::HealthState;
pub use prometheus::MetricsRegistry;

/// Serve metrics and health probes on one listener until shutdown.
#[instrument(skip(metrics, health, shutdown_rx))]
pub async fn serve(
    bind_address: String,
    metrics: Arc<MetricsRegistry>,
    health: Arc<HealthState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = metrics.router().merge(health::router(health));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Metrics and health server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}
