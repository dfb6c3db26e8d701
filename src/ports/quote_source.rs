//! Quote Source Port - One Venue's Top of Book
//!
//! A quote source yields the current best ask / best bid for its
//! venue, already converted to the common currency and unit basis.

use async_trait::async_trait;

use crate::domain::quote::Quote;

/// Trait for venue quote providers.
///
/// Implementations must never return a non-positive price; `Quote`
/// construction enforces this, so adapters surface bad data as errors.
/// Calls are read-only and idempotent, so the poll loop may issue the
/// two venues' fetches concurrently.
#[async_trait]
pub trait QuoteSource: Send + Sync + 'static {
  /// Short venue label used in logs, metrics, and messages.
  fn venue(&self) -> &str;

  /// Fetch the current quote.
  async fn fetch_quote(&self) -> anyhow::Result<Quote>;
}
