//! Vescalc Rates Engine
//!
//! Rate acquisition for the conversion calculator: the official reference
//! rate, the aggregated peer-to-peer marketplace rate, and the pure
//! derivation combining them with a user amount.
//!
//! # Features
//!
//! - Reference-rate fetch with per-request timeout and health probe
//! - Sequential paginated marketplace search with verified-counterparty
//!   filtering and price statistics
//! - Lenient wire schemas for both upstream JSON formats
//!
//! # Example
//!
//! ```rust,ignore
//! use vescalc_rates::{convert, BcvClient, MarketAggregator, MarketConfig, ReferenceConfig};
//!
//! let reference = BcvClient::new(ReferenceConfig::default());
//! let market = MarketAggregator::over_http(MarketConfig::default());
//!
//! let fiat = reference.fetch_rate().await?;
//! let aggregate = market.search(None, 5, 20).await?;
//!
//! let figures = convert(amount, &fiat, &aggregate);
//! ```

pub mod conversion;
pub mod error;
pub mod market;
pub mod reference;
pub mod wire;

pub use conversion::{convert, Conversion};
pub use error::{AggregationReason, RateError, RateResult};
pub use market::{
    HttpSearchTransport, MarketAggregator, MarketConfig, MarketFeed, SearchTransport,
};
pub use reference::{BcvClient, FiatRateSource, ReferenceConfig, SourceHealth};

#[cfg(any(test, feature = "test-utils"))]
pub use market::{aggregate_with_average, MockMarketFeed, ScriptedTransport};
#[cfg(any(test, feature = "test-utils"))]
pub use reference::MockFiatSource;
