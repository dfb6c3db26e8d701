//! Alert state machine with hysteresis.
//!
//! Two states, `Closed` (initial) and `Open`. An alert opens when the
//! spread magnitude exceeds the open threshold, re-notifies only when
//! the magnitude widens by more than the rearm delta past the last
//! notified magnitude, and closes (exactly once) when the magnitude
//! falls back to or below the threshold.
//!
//! Transitions are computed with [`AlertStateMachine::propose`] and
//! only take effect through [`AlertStateMachine::commit`], so a caller
//! whose notification delivery fails can drop the transition and leave
//! the machine untouched.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::quote::Observation;
use super::spread::SpreadResult;

/// Default materiality threshold in percent (absolute value).
pub const OPEN_THRESHOLD: Decimal = dec!(0.25);

/// Default additional widening, in percent, that re-arms a notification.
pub const REARM_DELTA: Decimal = dec!(0.05);

/// Threshold pair driving the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertThresholds {
    pub open_threshold: Decimal,
    pub rearm_delta: Decimal,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            open_threshold: OPEN_THRESHOLD,
            rearm_delta: REARM_DELTA,
        }
    }
}

/// Process-lifetime alert state. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertState {
    pub is_open: bool,
    pub last_notified_abs_percent: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertKind {
    Opened,
    Updated,
    Closed,
}

impl AlertKind {
    /// Metric / log label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Updated => "updated",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition that must be notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEvent {
    /// Notification number, starting at 1 for the process lifetime.
    pub sequence_no: u64,
    pub kind: AlertKind,
    pub observation: Observation,
    pub spread: SpreadResult,
}

/// A computed but not yet applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    next_state: AlertState,
    event: Option<AlertEvent>,
}

impl Transition {
    /// Event to notify, if this transition emits one.
    pub fn event(&self) -> Option<&AlertEvent> {
        self.event.as_ref()
    }

    /// State the machine moves to once committed.
    pub fn next_state(&self) -> AlertState {
        self.next_state
    }
}

/// Owns the alert state and the notification counter.
#[derive(Debug, Clone)]
pub struct AlertStateMachine {
    thresholds: AlertThresholds,
    state: AlertState,
    /// Sequence number the next emitted event receives.
    next_sequence_no: u64,
}

impl Default for AlertStateMachine {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

impl AlertStateMachine {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            state: AlertState::default(),
            next_sequence_no: 1,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    /// Number of events committed so far.
    pub fn notified_count(&self) -> u64 {
        self.next_sequence_no - 1
    }

    /// Compute the transition for this tick without applying it.
    pub fn propose(&self, observation: &Observation, spread: &SpreadResult) -> Transition {
        let magnitude = spread.abs_percent();
        let above = magnitude > self.thresholds.open_threshold;

        let (next_state, kind) = match (self.state.is_open, above) {
            (false, false) => (self.state, None),
            (false, true) => (
                AlertState {
                    is_open: true,
                    last_notified_abs_percent: magnitude,
                },
                Some(AlertKind::Opened),
            ),
            (true, true) => {
                let widening = magnitude - self.state.last_notified_abs_percent;
                if widening > self.thresholds.rearm_delta {
                    (
                        AlertState {
                            is_open: true,
                            last_notified_abs_percent: magnitude,
                        },
                        Some(AlertKind::Updated),
                    )
                } else {
                    (self.state, None)
                }
            }
            (true, false) => (AlertState::default(), Some(AlertKind::Closed)),
        };

        let event = kind.map(|kind| AlertEvent {
            sequence_no: self.next_sequence_no,
            kind,
            observation: observation.clone(),
            spread: *spread,
        });

        Transition { next_state, event }
    }

    /// Apply a transition produced by [`propose`](Self::propose) on the
    /// current state.
    pub fn commit(&mut self, transition: Transition) {
        self.state = transition.next_state;
        if transition.event.is_some() {
            self.next_sequence_no += 1;
        }
    }

    /// Propose and commit in one step.
    pub fn advance(&mut self, observation: &Observation, spread: &SpreadResult) -> Option<AlertEvent> {
        let transition = self.propose(observation, spread);
        let event = transition.event.clone();
        self.commit(transition);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quote::Quote;
    use crate::domain::spread::SpreadDirection;
    use chrono::Utc;

    fn observation() -> Observation {
        let q = Quote::new(dec!(100), dec!(100)).unwrap();
        Observation::new(Utc::now(), q, q)
    }

    fn spread(pct: Decimal) -> SpreadResult {
        SpreadResult {
            signed_percent: pct,
            direction: SpreadDirection::MidVsMid,
        }
    }

    fn kinds(machine: &mut AlertStateMachine, spreads: &[Decimal]) -> Vec<Option<AlertKind>> {
        let obs = observation();
        spreads
            .iter()
            .map(|s| machine.advance(&obs, &spread(*s)).map(|e| e.kind))
            .collect()
    }

    #[test]
    fn test_initial_state_is_closed() {
        let machine = AlertStateMachine::default();
        assert_eq!(machine.state(), AlertState::default());
        assert!(!machine.state().is_open);
        assert_eq!(machine.notified_count(), 0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut machine = AlertStateMachine::default();
        let got = kinds(&mut machine, &[dec!(0.25), dec!(-0.25)]);
        assert_eq!(got, vec![None, None]);
        assert!(!machine.state().is_open);
    }

    #[test]
    fn test_open_records_magnitude_of_negative_spread() {
        let mut machine = AlertStateMachine::default();
        let event = machine.advance(&observation(), &spread(dec!(-0.30))).unwrap();
        assert_eq!(event.kind, AlertKind::Opened);
        assert_eq!(event.sequence_no, 1);
        assert_eq!(machine.state().last_notified_abs_percent, dec!(0.30));
    }

    #[test]
    fn test_rearm_requires_strict_widening() {
        let mut machine = AlertStateMachine::default();
        let got = kinds(
            &mut machine,
            &[dec!(0.30), dec!(0.35), dec!(0.36), dec!(0.40), dec!(0.41)],
        );
        assert_eq!(
            got,
            vec![Some(AlertKind::Opened), None, Some(AlertKind::Updated), None, None]
        );
        assert_eq!(machine.state().last_notified_abs_percent, dec!(0.36));
    }

    #[test]
    fn test_narrowing_while_open_is_silent() {
        let mut machine = AlertStateMachine::default();
        let got = kinds(&mut machine, &[dec!(0.60), dec!(0.30), dec!(0.34)]);
        assert_eq!(got, vec![Some(AlertKind::Opened), None, None]);
        assert_eq!(machine.state().last_notified_abs_percent, dec!(0.60));
    }

    #[test]
    fn test_close_resets_and_sequence_continues() {
        let mut machine = AlertStateMachine::default();
        let obs = observation();

        let opened = machine.advance(&obs, &spread(dec!(0.40))).unwrap();
        let closed = machine.advance(&obs, &spread(dec!(0.10))).unwrap();
        assert!(machine.advance(&obs, &spread(dec!(0.05))).is_none());
        let reopened = machine.advance(&obs, &spread(dec!(-0.50))).unwrap();

        assert_eq!(closed.kind, AlertKind::Closed);
        assert_eq!(machine.state().last_notified_abs_percent, dec!(0.50));
        assert_eq!(
            vec![opened.sequence_no, closed.sequence_no, reopened.sequence_no],
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_close_state_is_reset_to_zero() {
        let mut machine = AlertStateMachine::default();
        kinds(&mut machine, &[dec!(0.40), dec!(0.20)]);
        assert_eq!(machine.state(), AlertState::default());
    }

    #[test]
    fn test_uncommitted_proposal_leaves_machine_untouched() {
        let mut machine = AlertStateMachine::default();
        let obs = observation();

        let first = machine.propose(&obs, &spread(dec!(0.40)));
        assert_eq!(first.event().map(|e| e.sequence_no), Some(1));
        assert_eq!(machine.state(), AlertState::default());

        // Same proposal again after dropping the first one.
        let retry = machine.propose(&obs, &spread(dec!(0.40)));
        assert_eq!(retry.event().map(|e| e.sequence_no), Some(1));
        machine.commit(retry);
        assert!(machine.state().is_open);
        assert_eq!(machine.notified_count(), 1);
    }

    #[test]
    fn test_custom_thresholds() {
        let mut machine = AlertStateMachine::new(AlertThresholds {
            open_threshold: dec!(1.0),
            rearm_delta: dec!(0.5),
        });
        let got = kinds(&mut machine, &[dec!(0.9), dec!(1.1), dec!(1.5), dec!(1.7)]);
        assert_eq!(got, vec![None, Some(AlertKind::Opened), None, Some(AlertKind::Updated)]);
    }
}
