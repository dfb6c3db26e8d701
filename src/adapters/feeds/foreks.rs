//! Foreks Spot Page Feed - Gold Spot Quote Source
//!
//! Reads the live gold spot ask/bid from a rendered web page through a
//! WebDriver session (chromedriver). The page streams prices into the
//! same elements, so the session and loaded page are kept across ticks
//! and only rebuilt after a failure.
//!
//! Displayed prices use Turkish locale formatting (`.` thousands,
//! `,` decimal) and are per gram; they are scaled by the configured
//! unit multiplier onto venue A's basis.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::ScrapeVenueConfig;
use crate::domain::quote::Quote;
use crate::ports::quote_source::QuoteSource;

/// Parse a locale-formatted decimal such as `"2.345,67"`.
///
/// Thousands separators (`.`) are stripped and the decimal comma is
/// converted to a point.
pub fn parse_locale_decimal(text: &str) -> Result<Decimal> {
    let normalized: String = text
        .trim()
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    anyhow::ensure!(!normalized.is_empty(), "Empty price text");

    Decimal::from_str(&normalized).with_context(|| format!("Invalid price text {text:?}"))
}

/// Scrape-based quote source backed by a WebDriver session.
pub struct ForeksSpotSource {
    config: ScrapeVenueConfig,
    /// Live session with the page already loaded.
    session: Mutex<Option<Client>>,
}

impl ForeksSpotSource {
    /// Create the source. The WebDriver session opens lazily on the
    /// first fetch.
    pub fn new(config: ScrapeVenueConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    /// Open a WebDriver session and load the quote page.
    async fn connect(&self) -> Result<Client> {
        let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
        if self.config.headless {
            args.push("--headless=new");
        }

        let mut capabilities = serde_json::Map::new();
        capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        let client = ClientBuilder::rustls()
            .capabilities(capabilities)
            .connect(&self.config.webdriver_url)
            .await
            .with_context(|| {
                format!("WebDriver session failed at {}", self.config.webdriver_url)
            })?;

        client
            .goto(&self.config.page_url)
            .await
            .with_context(|| format!("Failed to load {}", self.config.page_url))?;

        info!(
            page = %self.config.page_url,
            webdriver = %self.config.webdriver_url,
            "Spot page session opened"
        );

        Ok(client)
    }

    /// Wait (bounded) for an element and parse its text.
    async fn read_price(&self, client: &Client, selector: &str) -> Result<Decimal> {
        let element = client
            .wait()
            .at_most(Duration::from_millis(self.config.element_wait_ms))
            .for_element(Locator::Css(selector))
            .await
            .with_context(|| format!("Element {selector} not found"))?;

        let text = element
            .text()
            .await
            .with_context(|| format!("Failed to read text of {selector}"))?;

        parse_locale_decimal(&text)
    }

    async fn read_quote(&self, client: &Client) -> Result<Quote> {
        let ask = self.read_price(client, &self.config.ask_selector).await?;
        let bid = self.read_price(client, &self.config.bid_selector).await?;

        debug!(%ask, %bid, "Spot page raw quote");

        Ok(Quote::new(ask, bid)?.scaled(self.config.unit_multiplier)?)
    }

    /// Close the WebDriver session, if one is open.
    pub async fn shutdown(&self) {
        if let Some(client) = self.session.lock().await.take() {
            if let Err(e) = client.close().await {
                warn!(error = %e, "Failed to close WebDriver session");
            }
        }
    }
}

#[async_trait]
impl QuoteSource for ForeksSpotSource {
    fn venue(&self) -> &str {
        &self.config.label
    }

    #[instrument(skip(self), fields(page = %self.config.page_url))]
    async fn fetch_quote(&self) -> Result<Quote> {
        let mut session = self.session.lock().await;

        if session.is_none() {
            *session = Some(self.connect().await?);
        }

        let result = match session.as_ref() {
            Some(client) => self.read_quote(client).await,
            None => Err(anyhow::anyhow!("WebDriver session unavailable")),
        };

        if result.is_err() {
            // Stale page or dead browser: start over on the next tick.
            if let Some(client) = session.take() {
                if let Err(e) = client.close().await {
                    debug!(error = %e, "Failed to close stale WebDriver session");
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_locale_decimal_thousands_and_comma() {
        assert_eq!(parse_locale_decimal("4.512,37").unwrap(), dec!(4512.37));
        assert_eq!(parse_locale_decimal("1.234.567,8").unwrap(), dec!(1234567.8));
    }

    #[test]
    fn test_parse_locale_decimal_plain_and_padded() {
        assert_eq!(parse_locale_decimal("  4512 ").unwrap(), dec!(4512));
        assert_eq!(parse_locale_decimal("0,5").unwrap(), dec!(0.5));
    }

    #[test]
    fn test_parse_locale_decimal_rejects_garbage() {
        assert!(parse_locale_decimal("").is_err());
        assert!(parse_locale_decimal("--").is_err());
        assert!(parse_locale_decimal("4,5,6").is_err());
    }

    #[test]
    fn test_scaled_spot_quote() {
        let raw = Quote::new(
            parse_locale_decimal("4.600,00").unwrap(),
            parse_locale_decimal("4.590,50").unwrap(),
        )
        .unwrap();
        let quote = raw.scaled(dec!(31.1035)).unwrap();
        assert_eq!(quote.ask(), dec!(143076.1));
        assert_eq!(quote.bid(), dec!(142780.61675));
    }
}
