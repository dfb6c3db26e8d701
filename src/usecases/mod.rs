//! Use Cases Layer - Application Workflow
//!
//! Orchestrates domain logic with port interfaces. The monitor has a
//! single workflow:
//! - `PollLoop`: fetch, persist, evaluate, alert on a fixed interval

pub mod poll_loop;

pub use poll_loop::{LoopSettings, PollLoop, TickOutcome, TickStage};
