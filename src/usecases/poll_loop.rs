//! Poll Loop - Fixed-Interval Spread Monitoring
//!
//! Drives one tick at a time:
//! 1. Fetches both venues' quotes (concurrently, joined before use)
//! 2. Persists the observation
//! 3. Evaluates the spread
//! 4. Advances the alert state machine
//! 5. Delivers any alert event to every recipient
//!
//! Each stage yields an explicit result. The first failing stage ends
//! the tick as `TickOutcome::Failed` and leaves the alert state as it
//! was; the loop then sleeps and tries again. Nothing escapes the loop.
//!
//! Recipients that accepted an event on a tick which never committed
//! (timed out mid-delivery) are not sent the same event again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::{HealthState, MetricsRegistry};
use crate::config::AppConfig;
use crate::domain::alert::{
  AlertEvent, AlertKind, AlertState, AlertStateMachine, AlertThresholds,
};
use crate::domain::quote::{Observation, Quote};
use crate::domain::spread::{MidpointBasis, SpreadEvaluator, SpreadResult};
use crate::error::MonitorError;
use crate::ports::notification::{NotificationSink, Recipient};
use crate::ports::observation_sink::ObservationSink;
use crate::ports::quote_source::QuoteSource;

/// Stage at which a tick stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickStage {
  Fetch,
  Persist,
  Evaluate,
  Notify,
  Timeout,
}

impl TickStage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Fetch => "fetch",
      Self::Persist => "persist",
      Self::Evaluate => "evaluate",
      Self::Notify => "notify",
      Self::Timeout => "timeout",
    }
  }
}

impl std::fmt::Display for TickStage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Result of one tick.
#[derive(Debug)]
pub enum TickOutcome {
  /// All side effects ran; the alert state reflects this tick.
  Completed {
    spread: SpreadResult,
    event: Option<AlertEvent>,
    /// Recipients that accepted the event.
    delivered: usize,
  },
  /// The tick stopped at `stage`; the alert state is unchanged.
  Failed {
    stage: TickStage,
    error: MonitorError,
  },
}

impl TickOutcome {
  pub fn is_completed(&self) -> bool {
    matches!(self, Self::Completed { .. })
  }

  fn failed(stage: TickStage, error: MonitorError) -> Self {
    Self::Failed { stage, error }
  }
}

/// Timing and decision parameters of the loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
  /// Pause between the end of one tick and the start of the next.
  pub poll_interval: Duration,
  /// Bound after which a stalled tick is abandoned.
  pub tick_timeout: Duration,
  pub thresholds: AlertThresholds,
  pub midpoint: MidpointBasis,
}

impl Default for LoopSettings {
  fn default() -> Self {
    Self {
      poll_interval: Duration::from_secs(5),
      tick_timeout: Duration::from_secs(20),
      thresholds: AlertThresholds::default(),
      midpoint: MidpointBasis::default(),
    }
  }
}

impl LoopSettings {
  pub fn from_config(config: &AppConfig) -> Self {
    Self {
      poll_interval: config.monitor.poll_interval(),
      tick_timeout: config.monitor.tick_timeout(),
      thresholds: config.spread.thresholds(),
      midpoint: config.spread.midpoint,
    }
  }
}

/// Recipients that already accepted an event that is not yet committed.
#[derive(Debug)]
struct PendingDelivery {
  sequence_no: u64,
  kind: AlertKind,
  accepted: Vec<Recipient>,
}

impl PendingDelivery {
  fn matches(&self, event: &AlertEvent) -> bool {
    self.sequence_no == event.sequence_no && self.kind == event.kind
  }
}

/// Orchestrates quote sources, sinks, and the alert state machine.
pub struct PollLoop {
  /// Tokenized gold venue.
  venue_a: Arc<dyn QuoteSource>,
  /// Physical spot venue.
  venue_b: Arc<dyn QuoteSource>,
  /// Observation storage.
  sink: Arc<dyn ObservationSink>,
  /// Alert delivery.
  notifier: Arc<dyn NotificationSink>,
  /// Pure spread evaluator.
  evaluator: SpreadEvaluator,
  /// Sole owner of the alert state.
  alerts: AlertStateMachine,
  /// Survives an abandoned tick so a retry skips who already has it.
  pending: Option<PendingDelivery>,
  settings: LoopSettings,
  metrics: Option<Arc<MetricsRegistry>>,
  health: Option<Arc<HealthState>>,
}

impl PollLoop {
  /// Create a new poll loop.
  pub fn new(
    venue_a: Arc<dyn QuoteSource>,
    venue_b: Arc<dyn QuoteSource>,
    sink: Arc<dyn ObservationSink>,
    notifier: Arc<dyn NotificationSink>,
    settings: LoopSettings,
  ) -> Self {
    Self {
      venue_a,
      venue_b,
      sink,
      notifier,
      evaluator: SpreadEvaluator::new(settings.midpoint),
      alerts: AlertStateMachine::new(settings.thresholds),
      pending: None,
      settings,
      metrics: None,
      health: None,
    }
  }

  /// Report tick results to Prometheus.
  pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  /// Report tick results to the readiness probe.
  pub fn with_health(mut self, health: Arc<HealthState>) -> Self {
    self.health = Some(health);
    self
  }

  /// Current alert state.
  pub fn alert_state(&self) -> AlertState {
    self.alerts.state()
  }

  /// Number of alert events delivered so far.
  pub fn notified_count(&self) -> u64 {
    self.alerts.notified_count()
  }

  /// Run ticks until shutdown.
  ///
  /// The sleep between ticks always happens, whatever the outcome of
  /// the tick. Shutdown is observed between ticks only.
  #[instrument(skip(self, shutdown_rx), name = "poll_loop")]
  pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    info!(
      venue_a = %self.venue_a.venue(),
      venue_b = %self.venue_b.venue(),
      interval_ms = self.settings.poll_interval.as_millis() as u64,
      tick_timeout_ms = self.settings.tick_timeout.as_millis() as u64,
      open_threshold = %self.settings.thresholds.open_threshold,
      rearm_delta = %self.settings.thresholds.rearm_delta,
      "Starting spread monitor"
    );

    loop {
      self.tick().await;

      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Shutdown signal received, stopping poll loop");
          break;
        }
        _ = tokio::time::sleep(self.settings.poll_interval) => {}
      }
    }

    Ok(())
  }

  /// Execute one bounded tick and report its outcome.
  pub async fn tick(&mut self) -> TickOutcome {
    let start = Instant::now();
    let bound = self.settings.tick_timeout;

    let outcome = match tokio::time::timeout(bound, self.run_stages()).await {
      Ok(outcome) => outcome,
      Err(_) => TickOutcome::failed(TickStage::Timeout, MonitorError::TickTimeout(bound)),
    };

    self.report(&outcome, start.elapsed());
    outcome
  }

  /// The tick body. The alert state is committed only as the very last
  /// step, so an abandoned or failed tick never changes it.
  async fn run_stages(&mut self) -> TickOutcome {
    let timestamp = Utc::now();

    // 1. Fetch both venues; evaluation needs both from the same tick
    let (venue_a, venue_b) = match self.fetch_quotes().await {
      Ok(quotes) => quotes,
      Err(error) => return TickOutcome::failed(TickStage::Fetch, error),
    };
    let observation = Observation::new(timestamp, venue_a, venue_b);

    // 2. Persist
    if let Err(e) = self.sink.record(&observation).await {
      return TickOutcome::failed(TickStage::Persist, MonitorError::Persistence(e));
    }

    // 3. Evaluate; the observation is already stored
    let spread = match self
      .evaluator
      .evaluate(&observation.venue_a, &observation.venue_b)
    {
      Ok(spread) => spread,
      Err(error) => return TickOutcome::failed(TickStage::Evaluate, error),
    };

    // 4. Decide
    let transition = self.alerts.propose(&observation, &spread);
    let Some(event) = transition.event().cloned() else {
      self.alerts.commit(transition);
      return TickOutcome::Completed {
        spread,
        event: None,
        delivered: 0,
      };
    };

    // 5. Notify, then commit
    match self.deliver(&event).await {
      Ok(delivered) => {
        self.alerts.commit(transition);
        self.pending = None;
        TickOutcome::Completed {
          spread,
          event: Some(event),
          delivered,
        }
      }
      Err(error) => TickOutcome::failed(TickStage::Notify, error),
    }
  }

  /// Fetch both quotes concurrently.
  async fn fetch_quotes(&self) -> Result<(Quote, Quote), MonitorError> {
    let (a, b) = tokio::join!(self.venue_a.fetch_quote(), self.venue_b.fetch_quote());

    let a = a.map_err(|source| MonitorError::Fetch {
      venue: self.venue_a.venue().to_string(),
      source,
    })?;
    let b = b.map_err(|source| MonitorError::Fetch {
      venue: self.venue_b.venue().to_string(),
      source,
    })?;

    Ok((a, b))
  }

  /// Send the event to every recipient, one message each.
  ///
  /// Succeeds if at least one recipient accepted it. Individual
  /// failures are logged and counted but do not stop the others.
  /// Acceptances are recorded as they happen, so they outlive a tick
  /// that is dropped by its timeout.
  async fn deliver(&mut self, event: &AlertEvent) -> Result<usize, MonitorError> {
    if !self.pending.as_ref().is_some_and(|p| p.matches(event)) {
      self.pending = Some(PendingDelivery {
        sequence_no: event.sequence_no,
        kind: event.kind,
        accepted: Vec::new(),
      });
    }

    let recipients = self.notifier.recipients();
    let mut delivered = 0;
    let mut last_error = None;

    for recipient in &recipients {
      if self
        .pending
        .as_ref()
        .is_some_and(|p| p.accepted.contains(recipient))
      {
        debug!(
          seq = event.sequence_no,
          %recipient,
          "Recipient already accepted this event, skipping"
        );
        delivered += 1;
        continue;
      }

      match self.notifier.send(event, recipient).await {
        Ok(()) => {
          delivered += 1;
          if let Some(pending) = self.pending.as_mut() {
            pending.accepted.push(recipient.clone());
          }
        }
        Err(e) => {
          warn!(
            seq = event.sequence_no,
            kind = %event.kind,
            %recipient,
            error = %e,
            "Alert delivery failed"
          );
          if let Some(metrics) = &self.metrics {
            metrics
              .delivery_failures
              .with_label_values(&[event.kind.as_str()])
              .inc();
          }
          last_error = Some(e);
        }
      }
    }

    match last_error {
      Some(source) if delivered == 0 => Err(MonitorError::Notification {
        sequence_no: event.sequence_no,
        attempted: recipients.len(),
        source,
      }),
      _ => Ok(delivered),
    }
  }

  /// Log and record a tick outcome uniformly.
  fn report(&self, outcome: &TickOutcome, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    let state = self.alerts.state();

    match outcome {
      TickOutcome::Completed {
        spread,
        event: Some(event),
        delivered,
      } => {
        info!(
          seq = event.sequence_no,
          kind = %event.kind,
          spread = %spread.signed_percent.round_dp(4),
          direction = %spread.direction,
          delivered,
          elapsed_ms,
          "Alert event delivered"
        );
      }
      TickOutcome::Completed { spread, .. } => {
        debug!(
          spread = %spread.signed_percent.round_dp(4),
          direction = %spread.direction,
          alert_open = state.is_open,
          elapsed_ms,
          "Tick completed"
        );
      }
      TickOutcome::Failed { stage, error } => {
        warn!(
          stage = %stage,
          error = %error,
          alert_open = state.is_open,
          elapsed_ms,
          "Tick failed, alert state unchanged"
        );
      }
    }

    if let Some(health) = &self.health {
      health.record_tick(outcome.is_completed());
    }

    let Some(metrics) = &self.metrics else {
      return;
    };

    let label = if outcome.is_completed() { "completed" } else { "failed" };
    metrics.ticks.with_label_values(&[label]).inc();
    metrics
      .tick_latency_ms
      .with_label_values(&[label])
      .observe(elapsed_ms as f64);
    metrics
      .alert_open
      .set(if state.is_open { 1.0 } else { 0.0 });

    match outcome {
      TickOutcome::Completed { spread, event, .. } => {
        if let Some(pct) = spread.signed_percent.to_f64() {
          metrics.spread_percent.set(pct);
        }
        if let Some(event) = event {
          metrics
            .alert_events
            .with_label_values(&[event.kind.as_str()])
            .inc();
        }
      }
      TickOutcome::Failed { stage, .. } => {
        metrics
          .tick_failures
          .with_label_values(&[stage.as_str()])
          .inc();
      }
    }
  }
}
