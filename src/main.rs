//! Gold Spread Monitor - Entry Point
//!
//! Initializes configuration, logging, the venue quote sources, the
//! observation sink and the email notifier, then runs the poll loop
//! until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml (or $SPREAD_MONITOR_CONFIG) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load secrets from env vars (SENDER, APP_PASSWORD, SUPABASE_*)
//! 4. Create Binance depth source and Foreks spot page source
//! 5. Create observation sink (Supabase or JSONL)
//! 6. Create SMTP notifier
//! 7. Spawn metrics/health server on the configured address
//! 8. Spawn the poll loop
//! 9. Wait for SIGINT → graceful shutdown (stop loop → close browser → exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use gold_spread_monitor::adapters::feeds::{BinanceDepthSource, ForeksSpotSource};
use gold_spread_monitor::adapters::metrics::{self, HealthState, MetricsRegistry};
use gold_spread_monitor::adapters::notify::{MessageComposer, SmtpNotifier};
use gold_spread_monitor::adapters::persistence::{JsonlSink, SupabaseSink};
use gold_spread_monitor::config::{self, AppConfig, PersistenceBackend, Secrets};
use gold_spread_monitor::ports::{ObservationSink, QuoteSource};
use gold_spread_monitor::usecases::{LoopSettings, PollLoop};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = config::loader::config_path();
    let config = config::loader::load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.monitor.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.monitor.name,
        version = env!("CARGO_PKG_VERSION"),
        interval_secs = config.monitor.poll_interval_secs,
        backend = ?config.persistence.backend,
        recipients = config.notify.recipients.len(),
        "Starting gold spread monitor"
    );

    // ── 3. Secrets ──────────────────────────────────────────
    let secrets = Secrets::from_env(config.persistence.backend)
        .context("Failed to load credentials from env")?;

    // ── 4. Venue quote sources ──────────────────────────────
    let venue_a = Arc::new(
        BinanceDepthSource::new(&config.venue_a).context("Failed to create venue A source")?,
    );
    let venue_b = Arc::new(ForeksSpotSource::new(config.venue_b.clone()));

    // ── 5. Observation sink ─────────────────────────────────
    let sink = build_sink(&config, &secrets).await?;

    // ── 6. Email notifier ───────────────────────────────────
    let tz: Tz = config
        .persistence
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid timezone: {e}"))?;
    let composer = MessageComposer::new(&config.venue_a.label, &config.venue_b.label, tz);
    let notifier = Arc::new(
        SmtpNotifier::new(&config.notify, &secrets.sender, &secrets.app_password, composer)
            .context("Failed to create SMTP notifier")?,
    );

    // ── 7. Shutdown channel + metrics/health server ─────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let health = Arc::new(HealthState::new());
    let registry = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);

    let server_handle = if config.metrics.enabled {
        let bind = config.metrics.bind_address.clone();
        let server_registry = Arc::clone(&registry);
        let server_health = Arc::clone(&health);
        let server_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) =
                metrics::serve(bind, server_registry, server_health, server_shutdown).await
            {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        None
    };

    // ── 8. Spawn the poll loop ──────────────────────────────
    let source_a: Arc<dyn QuoteSource> = venue_a;
    let source_b: Arc<dyn QuoteSource> = venue_b.clone();
    let mut poll_loop = PollLoop::new(
        source_a,
        source_b,
        sink,
        notifier,
        LoopSettings::from_config(&config),
    )
    .with_health(Arc::clone(&health));
    if config.metrics.enabled {
        poll_loop = poll_loop.with_metrics(registry);
    }

    let loop_shutdown = shutdown_tx.subscribe();
    let loop_handle = tokio::spawn(async move {
        if let Err(e) = poll_loop.run(loop_shutdown).await {
            error!(error = %e, "Poll loop failed");
        }
    });

    info!("Monitor running");

    // ── 9. Wait for SIGINT ──────────────────────────────────
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for SIGINT, shutting down");
    } else {
        info!("SIGINT received, initiating graceful shutdown");
    }

    // 1. Readiness probe → 503, then stop all tasks
    health.mark_shutting_down();
    let _ = shutdown_tx.send(());

    // 2. Let an in-flight tick finish (bounded by its own timeout)
    let grace = config.monitor.tick_timeout() + Duration::from_secs(1);
    if tokio::time::timeout(grace, loop_handle).await.is_err() {
        error!("Poll loop did not stop within the grace period");
    }

    // 3. Close the browser session
    venue_b.shutdown().await;

    // 4. Stop the metrics server
    if let Some(handle) = server_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Build the configured observation sink.
async fn build_sink(config: &AppConfig, secrets: &Secrets) -> Result<Arc<dyn ObservationSink>> {
    let sink: Arc<dyn ObservationSink> = match config.persistence.backend {
        PersistenceBackend::Supabase => {
            let url = secrets
                .supabase_url
                .as_deref()
                .context("SUPABASE_URL not set")?;
            let key = secrets
                .supabase_key
                .as_deref()
                .context("SUPABASE_KEY not set")?;
            Arc::new(
                SupabaseSink::new(url, key, &config.persistence)
                    .context("Failed to create Supabase sink")?,
            )
        }
        PersistenceBackend::Jsonl => Arc::new(
            JsonlSink::new(&config.persistence)
                .await
                .context("Failed to create JSONL sink")?,
        ),
    };

    if !sink.is_healthy().await {
        warn!(
            backend = ?config.persistence.backend,
            "Observation sink health check failed at startup, continuing"
        );
    }

    Ok(sink)
}
