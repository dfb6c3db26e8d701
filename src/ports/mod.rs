//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the poll loop requires from
//! the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `QuoteSource`: Top-of-book quote for one venue
//! - `ObservationSink`: Durable storage of each tick's quotes
//! - `NotificationSink`: Delivery of alert events to recipients

pub mod notification;
pub mod observation_sink;
pub mod quote_source;

pub use notification::{NotificationSink, Recipient};
pub use observation_sink::ObservationSink;
pub use quote_source::QuoteSource;
