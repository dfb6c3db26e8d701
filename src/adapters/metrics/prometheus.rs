//! Prometheus Metrics Registry - Monitor Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards:
//! tick outcomes, per-stage failures, alert events, and the current
//! spread.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

/// Centralized Prometheus metrics for the monitor.
///
/// All metrics follow the naming convention `spread_monitor_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Ticks by outcome (`completed`, `failed`).
    pub ticks: IntCounterVec,
    /// Failed ticks by stage (`fetch`, `persist`, `notify`, `timeout`).
    pub tick_failures: IntCounterVec,
    /// Tick duration in milliseconds.
    pub tick_latency_ms: HistogramVec,
    /// Alert events committed, by kind.
    pub alert_events: IntCounterVec,
    /// Individual recipient deliveries that failed, by event kind.
    pub delivery_failures: IntCounterVec,
    /// Latest signed spread in percent.
    pub spread_percent: Gauge,
    /// Alert status (1 = open).
    pub alert_open: Gauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let ticks = IntCounterVec::new(
            Opts::new("spread_monitor_ticks_total", "Ticks by outcome"),
            &["outcome"],
        )?;

        let tick_failures = IntCounterVec::new(
            Opts::new(
                "spread_monitor_tick_failures_total",
                "Failed ticks by failing stage",
            ),
            &["stage"],
        )?;

        let tick_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "spread_monitor_tick_latency_ms",
                "Tick duration in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 20000.0,
            ]),
            &["outcome"],
        )?;

        let alert_events = IntCounterVec::new(
            Opts::new(
                "spread_monitor_alert_events_total",
                "Alert events delivered, by kind",
            ),
            &["kind"],
        )?;

        let delivery_failures = IntCounterVec::new(
            Opts::new(
                "spread_monitor_delivery_failures_total",
                "Individual alert deliveries that failed, by event kind",
            ),
            &["kind"],
        )?;

        let spread_percent = Gauge::new(
            "spread_monitor_spread_percent",
            "Latest signed cross-venue spread in percent",
        )?;

        let alert_open = Gauge::new(
            "spread_monitor_alert_open",
            "Whether an alert is open (1=yes, 0=no)",
        )?;

        // Register all metrics
        registry.register(Box::new(ticks.clone()))?;
        registry.register(Box::new(tick_failures.clone()))?;
        registry.register(Box::new(tick_latency_ms.clone()))?;
        registry.register(Box::new(alert_events.clone()))?;
        registry.register(Box::new(delivery_failures.clone()))?;
        registry.register(Box::new(spread_percent.clone()))?;
        registry.register(Box::new(alert_open.clone()))?;

        Ok(Self {
            registry,
            ticks,
            tick_failures,
            tick_latency_ms,
            alert_events,
            delivery_failures,
            spread_percent,
            alert_open,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Router exposing `/metrics`.
    pub fn router(self: Arc<Self>) -> Router {
        Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&self);
                async move { metrics.render() }
            }),
        )
    }
}
