//! Notification Adapters - Alert Delivery
//!
//! - `message`: subject/body rendering of an alert event
//! - `smtp`: STARTTLS email delivery, one message per recipient

pub mod message;
pub mod smtp;

pub use message::{AlertMessage, MessageComposer};
pub use smtp::SmtpNotifier;
