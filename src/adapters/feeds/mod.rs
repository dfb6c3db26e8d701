//! Quote Source Adapters - Venue Price Feeds
//!
//! Provides the two venue quote sources:
//! - Binance: PAXG top of book from the REST depth endpoint
//! - Foreks: gold spot ask/bid scraped from the rendered quote page

pub mod binance;
pub mod foreks;

pub use binance::BinanceDepthSource;
pub use foreks::ForeksSpotSource;
