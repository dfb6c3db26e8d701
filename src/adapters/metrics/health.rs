//! Health Check Endpoints - Liveness and Readiness Probes
//!
//! `/live` answers 200 while the process runs. `/ready` answers 200
//! only while the most recent tick completed and the monitor is not
//! shutting down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

/// Shared health state updated by the poll loop.
#[derive(Debug, Default)]
pub struct HealthState {
    /// Whether the most recent tick completed.
    last_tick_ok: AtomicBool,
    /// Set once shutdown begins.
    shutting_down: AtomicBool,
}

impl HealthState {
    /// Create a new health state (not ready until the first tick completes).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, ok: bool) {
        self.last_tick_ok.store(ok, Ordering::Relaxed);
    }

    pub fn mark_shutting_down(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
    }

    /// Ready when the last tick completed and shutdown has not begun.
    pub fn is_ready(&self) -> bool {
        self.last_tick_ok.load(Ordering::Relaxed) && !self.shutting_down.load(Ordering::Relaxed)
    }
}

/// Router exposing `/live` and `/ready`.
pub fn router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: returns 200 only after a completed tick.
async fn readiness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}
