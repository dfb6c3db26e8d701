//! Quote and observation types.
//!
//! A `Quote` is one venue's top of book, already normalized to the
//! common currency and unit basis. An `Observation` pairs the two
//! venues' quotes for a single tick.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// Best ask / best bid for one venue.
///
/// Both prices are strictly positive. No ordering between ask and bid
/// is enforced: source data may be crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    ask: Decimal,
    bid: Decimal,
}

impl Quote {
    /// Build a quote, rejecting non-positive prices.
    pub fn new(ask: Decimal, bid: Decimal) -> Result<Self, MonitorError> {
        if ask <= Decimal::ZERO || bid <= Decimal::ZERO {
            return Err(MonitorError::InvalidQuote { ask, bid });
        }
        Ok(Self { ask, bid })
    }

    /// Lowest price a seller on this venue accepts.
    pub fn ask(&self) -> Decimal {
        self.ask
    }

    /// Highest price a buyer on this venue pays.
    pub fn bid(&self) -> Decimal {
        self.bid
    }

    /// Scale both sides by a positive unit conversion factor.
    pub fn scaled(&self, factor: Decimal) -> Result<Self, MonitorError> {
        let scale = |price: Decimal| {
            price.checked_mul(factor).ok_or(MonitorError::Overflow {
                operation: "unit scaling",
                lhs: price,
                rhs: factor,
            })
        };
        Self::new(scale(self.ask)?, scale(self.bid)?)
    }
}

/// Both venues' quotes captured in the same tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Instant the tick started.
    pub timestamp: DateTime<Utc>,
    /// Tokenized gold venue (PAXG order book).
    pub venue_a: Quote,
    /// Physical gold spot venue (scraped page).
    pub venue_b: Quote,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, venue_a: Quote, venue_b: Quote) -> Self {
        Self {
            timestamp,
            venue_a,
            venue_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_accepts_crossed_prices() {
        let quote = Quote::new(dec!(99.0), dec!(100.0)).unwrap();
        assert_eq!(quote.ask(), dec!(99.0));
        assert_eq!(quote.bid(), dec!(100.0));
    }

    #[test]
    fn test_quote_rejects_zero_and_negative() {
        assert!(Quote::new(Decimal::ZERO, dec!(1.0)).is_err());
        assert!(Quote::new(dec!(1.0), dec!(-0.01)).is_err());
    }

    #[test]
    fn test_scaled_multiplies_both_sides() {
        let quote = Quote::new(dec!(2.0), dec!(1.5)).unwrap();
        let scaled = quote.scaled(dec!(31.1035)).unwrap();
        assert_eq!(scaled.ask(), dec!(62.2070));
        assert_eq!(scaled.bid(), dec!(46.65525));
    }

    #[test]
    fn test_scaled_overflow_is_an_error() {
        let quote = Quote::new(Decimal::MAX, dec!(1.0)).unwrap();
        assert!(matches!(
            quote.scaled(dec!(31.1035)),
            Err(MonitorError::Overflow { .. })
        ));
    }
}
