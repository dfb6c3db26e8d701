//! Observation Sink Port - Durable Tick Storage
//!
//! Receives one observation per tick. The core keeps no history of
//! its own; whatever the sink stores is the only record.

use async_trait::async_trait;

use crate::domain::quote::Observation;

/// Trait for observation persistence backends.
#[async_trait]
pub trait ObservationSink: Send + Sync + 'static {
  /// Store one observation.
  ///
  /// An `Err` fails the tick. It is not retried. A backend that answers
  /// with an empty acknowledgment logs it and returns `Ok`.
  async fn record(&self, observation: &Observation) -> anyhow::Result<()>;

  /// Check if the backend is reachable/writable.
  async fn is_healthy(&self) -> bool;
}
