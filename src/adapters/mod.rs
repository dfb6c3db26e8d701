//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, WebDriver, SMTP, file I/O).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `feeds`: Venue quote sources (Binance REST, Foreks spot page)
//! - `metrics`: Prometheus metrics export and health checks
//! - `notify`: Alert email composition and SMTP delivery
//! - `persistence`: Supabase rows or local JSONL observation log

pub mod feeds;
pub mod metrics;
pub mod notify;
pub mod persistence;
