//! Cross-venue spread evaluation.
//!
//! Turns the two quotes of an observation into a signed spread
//! percentage plus the leg pair it was measured on. Branch order is a
//! fixed tie-break policy: a clean B-over-A leg is checked first, then
//! A-over-B, and only when neither venue crosses the other does the
//! evaluator fall back to a midpoint comparison.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::quote::Quote;
use crate::error::MonitorError;

/// Which legs the spread was measured between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadDirection {
    /// Venue A ask against venue B bid (B's buyers pay more than A's sellers ask).
    AAskVsBBid,
    /// Venue B ask against venue A bid (A's buyers pay more than B's sellers ask).
    BAskVsABid,
    /// No venue crosses the other; midpoints compared.
    MidVsMid,
}

impl std::fmt::Display for SpreadDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AAskVsBBid => write!(f, "A_ASK_VS_B_BID"),
            Self::BAskVsABid => write!(f, "B_ASK_VS_A_BID"),
            Self::MidVsMid => write!(f, "MID_VS_MID"),
        }
    }
}

/// Signed spread for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpreadResult {
    /// Spread in percent. Negative when venue A is the cheaper side.
    pub signed_percent: Decimal,
    pub direction: SpreadDirection,
}

impl SpreadResult {
    /// Magnitude used by the alert thresholds.
    pub fn abs_percent(&self) -> Decimal {
        self.signed_percent.abs()
    }
}

/// How venue A's side of the midpoint fallback is formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidpointBasis {
    /// `(A.bid + A.bid) / 2`, i.e. venue A's bid alone. Matches the
    /// numbers the monitor has always produced.
    #[default]
    VenueABid,
    /// `(A.ask + A.bid) / 2`, a true midpoint.
    TrueMid,
}

/// Pure spread evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadEvaluator {
    midpoint: MidpointBasis,
}

impl SpreadEvaluator {
    pub fn new(midpoint: MidpointBasis) -> Self {
        Self { midpoint }
    }

    /// Evaluate the spread between venue A and venue B.
    ///
    /// Quotes are guaranteed positive by construction, so every
    /// division below has a non-zero denominator. Results outside the
    /// decimal range are reported as `MonitorError::Overflow`.
    pub fn evaluate(&self, a: &Quote, b: &Quote) -> Result<SpreadResult, MonitorError> {
        if b.bid() > a.ask() {
            return Ok(SpreadResult {
                signed_percent: relative_percent(a.ask(), b.bid())?,
                direction: SpreadDirection::AAskVsBBid,
            });
        }

        if a.bid() > b.ask() {
            return Ok(SpreadResult {
                signed_percent: relative_percent(a.bid(), b.ask())?,
                direction: SpreadDirection::BAskVsABid,
            });
        }

        let mid_a = match self.midpoint {
            MidpointBasis::VenueABid => midpoint(a.bid(), a.bid())?,
            MidpointBasis::TrueMid => midpoint(a.ask(), a.bid())?,
        };
        let mid_b = midpoint(b.ask(), b.bid())?;

        Ok(SpreadResult {
            signed_percent: relative_percent(mid_a, mid_b)?,
            direction: SpreadDirection::MidVsMid,
        })
    }
}

/// `(value - base) / base * 100`.
fn relative_percent(value: Decimal, base: Decimal) -> Result<Decimal, MonitorError> {
    value
        .checked_sub(base)
        .and_then(|diff| diff.checked_div(base))
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or(MonitorError::Overflow {
            operation: "relative spread",
            lhs: value,
            rhs: base,
        })
}

fn midpoint(x: Decimal, y: Decimal) -> Result<Decimal, MonitorError> {
    x.checked_add(y)
        .and_then(|sum| sum.checked_div(dec!(2)))
        .ok_or(MonitorError::Overflow {
            operation: "midpoint",
            lhs: x,
            rhs: y,
        })
}
