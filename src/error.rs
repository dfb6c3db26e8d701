//! Error taxonomy for the monitor.
//!
//! Adapters report failures as `anyhow::Error`; the poll loop tags them
//! with the stage that failed. Only `Configuration` is fatal, and only
//! at startup.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Network, HTTP status, or parse failure from a quote source.
    #[error("failed to fetch quote from {venue}: {source:#}")]
    Fetch {
        venue: String,
        #[source]
        source: anyhow::Error,
    },

    /// The observation sink rejected the row or was unreachable.
    #[error("failed to persist observation: {0:#}")]
    Persistence(#[source] anyhow::Error),

    /// Every configured recipient failed for an alert event.
    #[error("failed to deliver alert #{sequence_no} to any of {attempted} recipient(s): {source:#}")]
    Notification {
        sequence_no: u64,
        attempted: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Missing or invalid configuration. Fatal before the first tick.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The tick ran past its bound and was abandoned.
    #[error("tick abandoned after {0:?}")]
    TickTimeout(Duration),

    /// Decimal arithmetic left the representable range.
    #[error("decimal overflow computing {operation} of {lhs} and {rhs}")]
    Overflow {
        operation: &'static str,
        lhs: Decimal,
        rhs: Decimal,
    },

    /// A source produced a non-positive price.
    #[error("invalid quote: ask={ask} bid={bid} (prices must be positive)")]
    InvalidQuote { ask: Decimal, bid: Decimal },
}
