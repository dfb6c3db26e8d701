//! Alert Message Composer
//!
//! Renders an alert event into the Turkish-language subject and body
//! the desk expects. Kept separate from the transport so the exact text
//! can be tested without a mail server.

use chrono_tz::Tz;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::alert::{AlertEvent, AlertKind};

const OPENED_LABEL: &str = "Arbitraj Fırsatı Oluştu";
const ENDED_LABEL: &str = "Arbitraj Fırsatı Sona Erdi";

/// Subject and plain-text body of one alert email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

/// Builds alert messages with the configured venue labels and timezone.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    venue_a: String,
    venue_b: String,
    tz: Tz,
}

impl MessageComposer {
    pub fn new(venue_a: impl Into<String>, venue_b: impl Into<String>, tz: Tz) -> Self {
        Self {
            venue_a: venue_a.into(),
            venue_b: venue_b.into(),
            tz,
        }
    }

    pub fn compose(&self, event: &AlertEvent) -> AlertMessage {
        let spread = event.spread.signed_percent;
        let shown = spread.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let time = event
            .observation
            .timestamp
            .with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        let subject = match event.kind {
            AlertKind::Opened | AlertKind::Updated => {
                format!("#{} {OPENED_LABEL} -> {shown:.2}% -> {time}", event.sequence_no)
            }
            AlertKind::Closed => {
                format!("#{} {ENDED_LABEL} -> {time} -> {shown:.2}%", event.sequence_no)
            }
        };

        // Positive spread: venue B is the buy leg, venue A the sell leg.
        let legs = if spread > Decimal::ZERO {
            format!("{} Alış & {} Satış", self.venue_b, self.venue_a)
        } else {
            format!("{} Alış & {} Satış", self.venue_a, self.venue_b)
        };

        let a = &event.observation.venue_a;
        let b = &event.observation.venue_b;
        let body = format!(
            "Spread is between {legs} \n\
             {va} Alış: {a_ask}\n\
             {va} Satış: {a_bid}\n\
             {vb} Alış: {b_ask}\n\
             {vb} Satış: {b_bid}\n\
             \n\
             Arbitraj Fırsatı: %{shown:.2}",
            va = self.venue_a,
            vb = self.venue_b,
            a_ask = a.ask(),
            a_bid = a.bid(),
            b_ask = b.ask(),
            b_bid = b.bid(),
        );

        AlertMessage { subject, body }
    }
}
