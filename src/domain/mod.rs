//! Domain layer - spread evaluation and alert decisions.
//!
//! Pure logic with no I/O (hexagonal architecture inner ring).
//! Everything here is testable without timers or network calls.

pub mod alert;
pub mod quote;
pub mod spread;

// Re-export core types for convenience
pub use alert::{
    AlertEvent, AlertKind, AlertState, AlertStateMachine, AlertThresholds, Transition,
};
pub use quote::{Observation, Quote};
pub use spread::{MidpointBasis, SpreadDirection, SpreadEvaluator, SpreadResult};
