//! Binance Depth Feed - PAXG Order-Book Quote Source
//!
//! Polls Binance's public REST depth endpoint and reduces the book to
//! its top level. Prices arrive as decimal strings and are parsed
//! straight into `Decimal` (no float round-trip).

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::RestVenueConfig;
use crate::domain::quote::Quote;
use crate::ports::quote_source::QuoteSource;

/// Binance `/api/v3/depth` response. Levels are `[price, quantity]`.
#[derive(Debug, Deserialize)]
struct DepthResponse {
    #[serde(rename = "lastUpdateId")]
    last_update_id: u64,
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

/// REST quote source for a Binance symbol.
pub struct BinanceDepthSource {
    http: Client,
    label: String,
    url: String,
    symbol: String,
    depth_limit: u32,
}

impl BinanceDepthSource {
    /// Create a new depth source from venue configuration.
    pub fn new(config: &RestVenueConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(2)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            label: config.label.clone(),
            url: format!("{}/api/v3/depth", config.base_url.trim_end_matches('/')),
            symbol: config.symbol.clone(),
            depth_limit: config.depth_limit,
        })
    }

    /// Reduce a raw depth document to its top-of-book quote.
    pub fn parse_top_of_book(body: &str) -> Result<Quote> {
        let depth: DepthResponse =
            serde_json::from_str(body).context("Invalid depth JSON")?;

        let best_ask = depth
            .asks
            .first()
            .context("Depth response has no asks")?;
        let best_bid = depth
            .bids
            .first()
            .context("Depth response has no bids")?;

        let ask = Decimal::from_str(&best_ask[0])
            .with_context(|| format!("Invalid ask price {:?}", best_ask[0]))?;
        let bid = Decimal::from_str(&best_bid[0])
            .with_context(|| format!("Invalid bid price {:?}", best_bid[0]))?;

        debug!(
            last_update_id = depth.last_update_id,
            %ask,
            %bid,
            "Depth top of book parsed"
        );

        Ok(Quote::new(ask, bid)?)
    }
}

#[async_trait]
impl QuoteSource for BinanceDepthSource {
    fn venue(&self) -> &str {
        &self.label
    }

    #[instrument(skip(self), fields(symbol = %self.symbol))]
    async fn fetch_quote(&self) -> Result<Quote> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("symbol", self.symbol.clone()),
                ("limit", self.depth_limit.to_string()),
            ])
            .send()
            .await
            .context("Depth request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read depth response")?;

        if !status.is_success() {
            anyhow::bail!("Binance API error {status}: {body}");
        }

        Self::parse_top_of_book(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DEPTH: &str = r#"{
        "lastUpdateId": 1027024,
        "bids": [["148210.00000000", "0.01200000"], ["148100.00000000", "0.50000000"]],
        "asks": [["148390.00000000", "0.00400000"], ["148500.00000000", "1.00000000"]]
    }"#;

    #[test]
    fn test_parse_top_of_book_uses_first_level() {
        let quote = BinanceDepthSource::parse_top_of_book(DEPTH).unwrap();
        assert_eq!(quote.ask(), dec!(148390));
        assert_eq!(quote.bid(), dec!(148210));
    }

    #[test]
    fn test_parse_rejects_empty_side() {
        let body = r#"{"lastUpdateId": 1, "bids": [], "asks": [["1.0", "1.0"]]}"#;
        let err = BinanceDepthSource::parse_top_of_book(body).unwrap_err();
        assert!(err.to_string().contains("no bids"));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(BinanceDepthSource::parse_top_of_book("<html>").is_err());
        assert!(BinanceDepthSource::parse_top_of_book(r#"{"code": -1121}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_zero_price() {
        let body = r#"{"lastUpdateId": 1, "bids": [["0.0", "1"]], "asks": [["1.0", "1"]]}"#;
        assert!(BinanceDepthSource::parse_top_of_book(body).is_err());
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let config = RestVenueConfig {
            label: "PAXG".to_string(),
            base_url: "https://api.binance.com/".to_string(),
            symbol: "PAXGTRY".to_string(),
            depth_limit: 5,
            timeout_ms: 1000,
        };
        let source = BinanceDepthSource::new(&config).unwrap();
        assert_eq!(source.url, "https://api.binance.com/api/v3/depth");
        assert_eq!(source.venue(), "PAXG");
    }
}
