//! Configuration Module - TOML-based Monitor Configuration
//!
//! Loads and validates configuration from `config.toml`. Credentials
//! never live in the file: they are read from environment variables
//! (see [`Secrets`]). Venue endpoints, thresholds, recipients, and the
//! poll interval are all externalized here.

pub mod loader;

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::domain::alert::{AlertThresholds, OPEN_THRESHOLD, REARM_DELTA};
use crate::domain::spread::MidpointBasis;
use crate::error::MonitorError;
use crate::ports::notification::Recipient;

/// Top-level monitor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Process identity and loop timing.
  pub monitor: MonitorConfig,
  /// Spread and alert thresholds.
  #[serde(default)]
  pub spread: SpreadConfig,
  /// Order-book REST venue.
  pub venue_a: RestVenueConfig,
  /// Scraped spot-price venue.
  pub venue_b: ScrapeVenueConfig,
  /// Observation storage.
  pub persistence: PersistenceConfig,
  /// Alert delivery.
  pub notify: NotifyConfig,
  /// Metrics and health endpoints.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Monitor identity and scheduling.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
  /// Human-readable monitor name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Pause after each tick, in seconds.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_secs: u64,
  /// Bound after which a stalled tick is abandoned. Defaults to four
  /// poll intervals, saturating at `Duration::MAX`.
  pub tick_timeout_secs: Option<u64>,
}

impl MonitorConfig {
  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs)
  }

  pub fn tick_timeout(&self) -> Duration {
    self
      .tick_timeout_secs
      .map(Duration::from_secs)
      .unwrap_or_else(|| self.poll_interval().saturating_mul(4))
  }
}

/// Spread evaluation and alert hysteresis.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadConfig {
  /// Absolute spread (percent) above which an alert opens.
  #[serde(default = "default_open_threshold")]
  pub open_threshold_pct: Decimal,
  /// Additional widening (percent) needed to re-notify an open alert.
  #[serde(default = "default_rearm_delta")]
  pub rearm_delta_pct: Decimal,
  /// Venue A side of the midpoint fallback.
  #[serde(default)]
  pub midpoint: MidpointBasis,
}

impl Default for SpreadConfig {
  fn default() -> Self {
    Self {
      open_threshold_pct: OPEN_THRESHOLD,
      rearm_delta_pct: REARM_DELTA,
      midpoint: MidpointBasis::default(),
    }
  }
}

impl SpreadConfig {
  pub fn thresholds(&self) -> AlertThresholds {
    AlertThresholds {
      open_threshold: self.open_threshold_pct,
      rearm_delta: self.rearm_delta_pct,
    }
  }
}

/// REST order-book venue (Binance depth endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct RestVenueConfig {
  /// Label used in logs and alert messages.
  #[serde(default = "default_venue_a_label")]
  pub label: String,
  /// API base URL.
  #[serde(default = "default_binance_url")]
  pub base_url: String,
  /// Trading pair symbol.
  #[serde(default = "default_symbol")]
  pub symbol: String,
  /// Order-book depth requested.
  #[serde(default = "default_depth_limit")]
  pub depth_limit: u32,
  /// Request timeout in milliseconds.
  #[serde(default = "default_http_timeout_ms")]
  pub timeout_ms: u64,
}

/// Rendered-page venue read through a WebDriver session.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeVenueConfig {
  /// Label used in logs and alert messages.
  #[serde(default = "default_venue_b_label")]
  pub label: String,
  /// Page exposing the live quote.
  #[serde(default = "default_page_url")]
  pub page_url: String,
  /// WebDriver (chromedriver) endpoint.
  #[serde(default = "default_webdriver_url")]
  pub webdriver_url: String,
  /// CSS selector of the ask element.
  #[serde(default = "default_ask_selector")]
  pub ask_selector: String,
  /// CSS selector of the bid element.
  #[serde(default = "default_bid_selector")]
  pub bid_selector: String,
  /// Bounded wait for each element, in milliseconds.
  #[serde(default = "default_element_wait_ms")]
  pub element_wait_ms: u64,
  /// Factor applied to the scraped quote to reach venue A's unit basis.
  #[serde(default = "default_unit_multiplier")]
  pub unit_multiplier: Decimal,
  /// Launch the browser headless.
  #[serde(default = "default_true")]
  pub headless: bool,
}

/// Where observations go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
  /// Supabase (PostgREST) table insert.
  #[default]
  Supabase,
  /// Local append-only JSONL files.
  Jsonl,
}

/// Observation persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  #[serde(default)]
  pub backend: PersistenceBackend,
  /// Target table for the Supabase backend.
  #[serde(default = "default_table")]
  pub table: String,
  /// Provenance label stored on every row.
  #[serde(default = "default_data_source")]
  pub data_source_label: String,
  /// IANA timezone both legs' timestamps are stored in.
  #[serde(default = "default_timezone")]
  pub timezone: String,
  /// Directory for the JSONL backend.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
  /// Request timeout in milliseconds.
  #[serde(default = "default_http_timeout_ms")]
  pub timeout_ms: u64,
}

/// Alert delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
  /// SMTP submission host.
  #[serde(default = "default_smtp_host")]
  pub smtp_host: String,
  /// SMTP submission port (STARTTLS).
  #[serde(default = "default_smtp_port")]
  pub smtp_port: u16,
  /// Per-message timeout in milliseconds.
  #[serde(default = "default_http_timeout_ms")]
  pub timeout_ms: u64,
  /// Every event is sent to each of these, one message per address.
  pub recipients: Vec<Recipient>,
}

/// Metrics and health configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Serve /metrics, /live and /ready.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Bind address for the metrics/health server.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

/// Credentials read from the environment.
#[derive(Clone)]
pub struct Secrets {
  /// Supabase project URL (`SUPABASE_URL`).
  pub supabase_url: Option<String>,
  /// Supabase service key (`SUPABASE_KEY`).
  pub supabase_key: Option<String>,
  /// Mail sender address (`SENDER`).
  pub sender: String,
  /// Mail app password (`APP_PASSWORD`).
  pub app_password: String,
}

impl std::fmt::Debug for Secrets {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Secrets")
      .field("supabase_url", &self.supabase_url)
      .field("supabase_key", &self.supabase_key.as_ref().map(|_| "<redacted>"))
      .field("sender", &self.sender)
      .field("app_password", &"<redacted>")
      .finish()
  }
}

impl Secrets {
  /// Load credentials from environment variables.
  ///
  /// `SENDER` and `APP_PASSWORD` are always required. `SUPABASE_URL`
  /// and `SUPABASE_KEY` are required only for the Supabase backend.
  pub fn from_env(backend: PersistenceBackend) -> Result<Self, MonitorError> {
    Self::from_lookup(backend, |key| std::env::var(key).ok())
  }

  /// Same as [`from_env`](Self::from_env) with an injectable lookup.
  pub fn from_lookup<F>(backend: PersistenceBackend, lookup: F) -> Result<Self, MonitorError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let required = |key: &str| {
      lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MonitorError::Configuration(format!("{key} not set")))
    };

    let (supabase_url, supabase_key) = match backend {
      PersistenceBackend::Supabase => {
        (Some(required("SUPABASE_URL")?), Some(required("SUPABASE_KEY")?))
      }
      PersistenceBackend::Jsonl => (lookup("SUPABASE_URL"), lookup("SUPABASE_KEY")),
    };

    Ok(Self {
      supabase_url,
      supabase_key,
      sender: required("SENDER")?,
      app_password: required("APP_PASSWORD")?,
    })
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_poll_interval() -> u64 {
  5
}

fn default_open_threshold() -> Decimal {
  OPEN_THRESHOLD
}

fn default_rearm_delta() -> Decimal {
  REARM_DELTA
}

fn default_venue_a_label() -> String {
  "PAXG".to_string()
}

fn default_binance_url() -> String {
  "https://api.binance.com".to_string()
}

fn default_symbol() -> String {
  "PAXGTRY".to_string()
}

fn default_depth_limit() -> u32 {
  5
}

fn default_http_timeout_ms() -> u64 {
  10_000
}

fn default_venue_b_label() -> String {
  "Gold Spot".to_string()
}

fn default_page_url() -> String {
  "https://www.foreks.com/altin-kuru/".to_string()
}

fn default_webdriver_url() -> String {
  "http://localhost:9515".to_string()
}

fn default_ask_selector() -> String {
  "span[data-field='o14_a']".to_string()
}

fn default_bid_selector() -> String {
  "span[data-field='o14_b']".to_string()
}

fn default_element_wait_ms() -> u64 {
  10_000
}

fn default_unit_multiplier() -> Decimal {
  dec!(31.1035) // troy ounce in grams
}

fn default_table() -> String {
  "MarketData".to_string()
}

fn default_data_source() -> String {
  "Binance+Foreks".to_string()
}

fn default_timezone() -> String {
  "Europe/Istanbul".to_string()
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_smtp_host() -> String {
  "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
  587
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn test_secrets_supabase_requires_db_credentials() {
    let vars = env(&[("SENDER", "a@example.com"), ("APP_PASSWORD", "pw")]);
    let err = Secrets::from_lookup(PersistenceBackend::Supabase, |k| vars.get(k).cloned())
      .unwrap_err();
    assert!(matches!(err, MonitorError::Configuration(ref m) if m.contains("SUPABASE_URL")));
  }

  #[test]
  fn test_secrets_jsonl_needs_only_mail_credentials() {
    let vars = env(&[("SENDER", "a@example.com"), ("APP_PASSWORD", "pw")]);
    let secrets =
      Secrets::from_lookup(PersistenceBackend::Jsonl, |k| vars.get(k).cloned()).unwrap();
    assert_eq!(secrets.sender, "a@example.com");
    assert!(secrets.supabase_url.is_none());
  }

  #[test]
  fn test_secrets_blank_value_is_missing() {
    let vars = env(&[("SENDER", "a@example.com"), ("APP_PASSWORD", "  ")]);
    let err =
      Secrets::from_lookup(PersistenceBackend::Jsonl, |k| vars.get(k).cloned()).unwrap_err();
    assert!(err.to_string().contains("APP_PASSWORD"));
  }

  #[test]
  fn test_secrets_debug_redacts_password() {
    let vars = env(&[("SENDER", "a@example.com"), ("APP_PASSWORD", "hunter2")]);
    let secrets =
      Secrets::from_lookup(PersistenceBackend::Jsonl, |k| vars.get(k).cloned()).unwrap();
    assert!(!format!("{secrets:?}").contains("hunter2"));
  }

  #[test]
  fn test_tick_timeout_defaults_to_four_intervals() {
    let monitor = MonitorConfig {
      name: "m".to_string(),
      log_level: default_log_level(),
      poll_interval_secs: 5,
      tick_timeout_secs: None,
    };
    assert_eq!(monitor.tick_timeout(), Duration::from_secs(20));
  }
}
