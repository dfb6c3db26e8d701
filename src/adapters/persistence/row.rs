//! Observation Row - Storage Shape of One Tick
//!
//! Both persistence backends write the same row: both venues' ask/bid,
//! a provenance label, and the tick instant rendered in a fixed civil
//! timezone for each leg.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::Observation;

/// Column layout of the `MarketData` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    /// Venue A (PAXG) ask.
    pub paxg_ask_try: Decimal,
    /// Venue A (PAXG) bid.
    pub paxg_bid_try: Decimal,
    /// Venue B (gold spot) ask, already on venue A's unit basis.
    pub ons_gold_ask_try: Decimal,
    /// Venue B (gold spot) bid, already on venue A's unit basis.
    pub ons_gold_bid_try: Decimal,
    /// Provenance label.
    pub data_source: String,
    /// Venue A leg instant (RFC 3339 with offset).
    pub paxg_timestamp: String,
    /// Venue B leg instant (RFC 3339 with offset).
    pub ons_gold_timestamp: String,
}

impl ObservationRow {
    /// Build a row for an observation.
    pub fn from_observation(observation: &Observation, data_source: &str, tz: Tz) -> Self {
        // Both legs share the tick instant.
        let stamp = observation.timestamp.with_timezone(&tz).to_rfc3339();

        Self {
            paxg_ask_try: observation.venue_a.ask(),
            paxg_bid_try: observation.venue_a.bid(),
            ons_gold_ask_try: observation.venue_b.ask(),
            ons_gold_bid_try: observation.venue_b.bid(),
            data_source: data_source.to_string(),
            paxg_timestamp: stamp.clone(),
            ons_gold_timestamp: stamp,
        }
    }
}
