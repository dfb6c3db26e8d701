//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SPREAD_MONITOR_CONFIG";

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Resolve the config path from the environment, falling back to
/// `config.toml` in the working directory.
pub fn config_path() -> String {
  std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    name = %config.monitor.name,
    interval_secs = config.monitor.poll_interval_secs,
    recipients = config.notify.recipients.len(),
    backend = ?config.persistence.backend,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  Ok(config)
}

/// Longest accepted pause between ticks.
const MAX_POLL_INTERVAL_SECS: u64 = 86_400;

/// Validate all configuration parameters.
///
/// Checks for:
/// - Poll interval between one second and one day, tick bound no shorter
/// - Positive thresholds and conversion factor
/// - Parseable timezone
/// - Non-empty endpoints, selectors, and recipient list
fn validate_config(config: &AppConfig) -> Result<()> {
  // Scheduling
  anyhow::ensure!(
    (1..=MAX_POLL_INTERVAL_SECS).contains(&config.monitor.poll_interval_secs),
    "poll_interval_secs must be between 1 and {MAX_POLL_INTERVAL_SECS}, got {}",
    config.monitor.poll_interval_secs
  );
  anyhow::ensure!(
    config.monitor.tick_timeout() >= config.monitor.poll_interval(),
    "tick_timeout_secs must be at least poll_interval_secs, got {:?}",
    config.monitor.tick_timeout()
  );

  // Thresholds
  anyhow::ensure!(
    config.spread.open_threshold_pct > Decimal::ZERO,
    "open_threshold_pct must be positive, got {}",
    config.spread.open_threshold_pct
  );
  anyhow::ensure!(
    config.spread.rearm_delta_pct >= Decimal::ZERO,
    "rearm_delta_pct must be non-negative, got {}",
    config.spread.rearm_delta_pct
  );

  // Venues
  anyhow::ensure!(
    !config.venue_a.base_url.is_empty() && !config.venue_a.symbol.is_empty(),
    "venue_a base_url and symbol must not be empty"
  );
  anyhow::ensure!(
    config.venue_a.depth_limit > 0,
    "venue_a depth_limit must be positive"
  );
  anyhow::ensure!(
    !config.venue_b.page_url.is_empty() && !config.venue_b.webdriver_url.is_empty(),
    "venue_b page_url and webdriver_url must not be empty"
  );
  anyhow::ensure!(
    !config.venue_b.ask_selector.is_empty() && !config.venue_b.bid_selector.is_empty(),
    "venue_b selectors must not be empty"
  );
  anyhow::ensure!(
    config.venue_b.unit_multiplier > Decimal::ZERO,
    "venue_b unit_multiplier must be positive, got {}",
    config.venue_b.unit_multiplier
  );

  // Persistence
  config
    .persistence
    .timezone
    .parse::<chrono_tz::Tz>()
    .map_err(|e| anyhow::anyhow!("Invalid persistence timezone: {e}"))?;

  // Notification
  anyhow::ensure!(
    !config.notify.recipients.is_empty(),
    "At least one notify recipient must be configured"
  );
  for (i, recipient) in config.notify.recipients.iter().enumerate() {
    anyhow::ensure!(
      recipient.as_str().contains('@'),
      "Recipient {} ({}) is not an email address",
      i,
      recipient
    );
  }

  Ok(())
}
