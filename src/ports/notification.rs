//! Notification Sink Port - Alert Delivery
//!
//! Delivers alert events, one message per recipient per event.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::alert::AlertEvent;

/// Opaque recipient descriptor (an email address for the SMTP adapter).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
  pub fn new(address: impl Into<String>) -> Self {
    Self(address.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Recipient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Trait for alert delivery channels.
///
/// The recipient set is configuration handed to the adapter at
/// construction; the poll loop asks for it and sends once per entry.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
  /// Recipients every event is delivered to.
  fn recipients(&self) -> Vec<Recipient>;

  /// Deliver one event to one recipient.
  async fn send(&self, event: &AlertEvent, recipient: &Recipient) -> anyhow::Result<()>;
}
