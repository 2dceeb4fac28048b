//! Marketplace search and price aggregation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use vescalc_common::{trunc2, CounterpartyType, MarketAd, MarketAggregate};

use crate::error::{AggregationReason, RateError, RateResult};
use crate::wire::{AdListing, SearchRequest, SearchResponse, TradeMethod};

/// Where aggregated marketplace prices come from.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Feed name for logging.
    fn name(&self) -> &str;

    /// Search the marketplace and aggregate verified-counterparty prices.
    ///
    /// `filter_amount` narrows listings to those accepting the given fiat
    /// amount; `min_required_ads` stops paging once enough verified ads have
    /// accumulated; `page_size` is the row count requested per page.
    async fn search(
        &self,
        filter_amount: Option<Decimal>,
        min_required_ads: usize,
        page_size: u32,
    ) -> RateResult<MarketAggregate>;
}

/// One page exchange with the marketplace.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Send one page request and parse its body.
    async fn fetch_page(&self, request: &SearchRequest) -> RateResult<SearchResponse>;
}

/// Configuration for the marketplace aggregator.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Marketplace search endpoint URL.
    pub endpoint: String,
    /// Asset being sold.
    pub asset: String,
    /// Fiat currency the prices are quoted in.
    pub fiat: String,
    /// Trade direction.
    pub trade_type: String,
    /// Label attached to returned aggregates.
    pub source_label: String,
    /// Hard cap on pages consumed by one search.
    pub page_cap: u32,
    /// Courtesy delay between consecutive page requests.
    pub page_delay: Duration,
    /// Cancellation timeout per page request.
    pub request_timeout: Duration,
    /// Upper bound the marketplace accepts for `rows`.
    pub max_page_size: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://p2p.binance.com/bapi/c2c/v2/friendly/c2c/adv/search"
                .to_string(),
            asset: "USDT".to_string(),
            fiat: "VES".to_string(),
            trade_type: "SELL".to_string(),
            source_label: "Binance P2P".to_string(),
            page_cap: 100,
            page_delay: Duration::from_millis(100),
            request_timeout: Duration::from_secs(15),
            max_page_size: 20,
        }
    }
}

/// reqwest-backed transport for the marketplace search endpoint.
pub struct HttpSearchTransport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSearchTransport {
    /// Create a transport for the given endpoint.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SearchTransport for HttpSearchTransport {
    async fn fetch_page(&self, request: &SearchRequest) -> RateResult<SearchResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(RateError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Http(status.as_u16()));
        }

        let text = response.text().await.map_err(RateError::from_transport)?;
        if text.trim().is_empty() {
            return Err(RateError::Parse("empty response body".to_string()));
        }
        serde_json::from_str(&text).map_err(|e| RateError::Parse(e.to_string()))
    }
}

/// Sequential paging aggregator over a marketplace search transport.
///
/// Page *n+1* is never requested before page *n* is processed, and a fixed
/// courtesy delay separates consecutive requests.
pub struct MarketAggregator {
    transport: Arc<dyn SearchTransport>,
    config: MarketConfig,
}

impl MarketAggregator {
    /// Create an aggregator over an explicit transport.
    pub fn new(transport: Arc<dyn SearchTransport>, config: MarketConfig) -> Self {
        Self { transport, config }
    }

    /// Aggregator wired to the real marketplace endpoint.
    pub fn over_http(config: MarketConfig) -> Self {
        let transport =
            HttpSearchTransport::new(config.endpoint.clone(), config.request_timeout);
        Self::new(Arc::new(transport), config)
    }

    fn build_request(
        &self,
        page: u32,
        rows: u32,
        filter_amount: Option<Decimal>,
    ) -> SearchRequest {
        SearchRequest {
            asset: self.config.asset.clone(),
            fiat: self.config.fiat.clone(),
            merchant_check: true,
            page,
            pay_types: Vec::new(),
            publisher_type: None,
            rows,
            trade_type: self.config.trade_type.clone(),
            trans_amount: filter_amount,
        }
    }
}

#[async_trait]
impl MarketFeed for MarketAggregator {
    fn name(&self) -> &str {
        &self.config.source_label
    }

    async fn search(
        &self,
        filter_amount: Option<Decimal>,
        min_required_ads: usize,
        page_size: u32,
    ) -> RateResult<MarketAggregate> {
        let rows = page_size.clamp(1, self.config.max_page_size);
        let filter = filter_amount
            .filter(|a| *a > Decimal::ZERO)
            .map(trunc2);

        let mut collected: Vec<AdListing> = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self.build_request(page, rows, filter);
            let response = match self.transport.fetch_page(&request).await {
                Ok(response) => response,
                // A transport-level failure on the first page is surfaced;
                // anything later degrades to "use what was collected".
                Err(e)
                    if page == 1
                        && matches!(e, RateError::Timeout | RateError::Connectivity(_)) =>
                {
                    return Err(e);
                }
                Err(e) => {
                    warn!(page, error = %e, "Page request failed, stopping pagination");
                    break;
                }
            };

            if !response.success || response.data.is_empty() {
                break;
            }

            let received = response.data.len();
            collected.extend(response.data.into_iter().filter(is_verified_listing));
            debug!(page, received, accumulated = collected.len(), "Page processed");

            if collected.len() >= min_required_ads {
                break;
            }
            if page >= self.config.page_cap {
                break;
            }

            page += 1;
            tokio::time::sleep(self.config.page_delay).await;
        }

        if collected.is_empty() {
            return Err(RateError::Aggregation(AggregationReason::NoVerifiedAds));
        }
        if collected.len() < min_required_ads {
            warn!(
                collected = collected.len(),
                expected = min_required_ads,
                "Fewer verified ads than requested"
            );
        }

        let ads: Vec<MarketAd> = collected.iter().map(map_listing).collect();
        let prices: Vec<Decimal> = ads
            .iter()
            .map(|ad| ad.unit_price)
            .filter(|p| *p > Decimal::ZERO)
            .collect();

        let (average, min, max) = price_stats(&prices)
            .ok_or(RateError::Aggregation(AggregationReason::NoValidPrices))?;

        info!(
            ad_count = prices.len(),
            pages = page,
            average = %average,
            "Marketplace aggregation complete"
        );

        Ok(MarketAggregate {
            average_price: average,
            min_price: min,
            max_price: max,
            ad_count: prices.len(),
            ads,
            filter_amount: filter,
            pages_queried: page,
            fiat: self.config.fiat.clone(),
            source: self.config.source_label.clone(),
            fetched_at: Utc::now(),
        })
    }
}

/// Mean (truncated to two decimals), min and max over positive prices.
fn price_stats(prices: &[Decimal]) -> Option<(Decimal, Decimal, Decimal)> {
    let first = *prices.first()?;
    let sum: Decimal = prices.iter().copied().sum();
    let average = trunc2(sum / Decimal::from(prices.len()));

    let (min, max) = prices.iter().copied().fold((first, first), |(lo, hi), p| {
        (lo.min(p), hi.max(p))
    });

    Some((average, min, max))
}

fn is_verified_listing(listing: &AdListing) -> bool {
    listing
        .advertiser
        .as_ref()
        .map(|adv| adv.user_type.as_deref() == Some("merchant"))
        .unwrap_or(false)
}

/// Map a raw listing into the domain model, defaulting every missing
/// numeric field to zero and every missing optional field to `None`.
fn map_listing(listing: &AdListing) -> MarketAd {
    let advertiser = listing.advertiser.clone().unwrap_or_default();
    let body = listing.adv.clone().unwrap_or_default();
    let counterparty_type = CounterpartyType::from_user_type(advertiser.user_type.as_deref());

    MarketAd {
        counterparty: advertiser
            .nick_name
            .or(advertiser.nick)
            .unwrap_or_else(|| "—".to_string()),
        counterparty_type,
        is_verified: counterparty_type == CounterpartyType::Merchant
            || advertiser.user_identity.as_deref() == Some("verified"),
        month_finish_rate: advertiser.month_finish_rate,
        month_order_count: advertiser.month_order_count,
        unit_price: body.price.unwrap_or(Decimal::ZERO),
        min_trade_amount: body.min_single_trans_amount.unwrap_or(Decimal::ZERO),
        max_trade_amount: body
            .dynamic_max_single_trans_amount
            .or(body.max_single_trans_amount)
            .unwrap_or(Decimal::ZERO),
        available_supply: body.surplus_amount.unwrap_or(Decimal::ZERO),
        payment_methods: body
            .trade_methods
            .iter()
            .filter_map(TradeMethod::display_name)
            .collect(),
    }
}

/// Scripted page transport for tests: pops pre-programmed page outcomes and
/// records every request it sees.
#[cfg(any(test, feature = "test-utils"))]
pub struct ScriptedTransport {
    pages: parking_lot::Mutex<std::collections::VecDeque<RateResult<SearchResponse>>>,
    requests: parking_lot::Mutex<Vec<SearchRequest>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ScriptedTransport {
    /// Create a transport that serves the given pages in order, then
    /// empty successful pages.
    pub fn new(pages: Vec<RateResult<SearchResponse>>) -> Self {
        Self {
            pages: parking_lot::Mutex::new(pages.into()),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl SearchTransport for ScriptedTransport {
    async fn fetch_page(&self, request: &SearchRequest) -> RateResult<SearchResponse> {
        self.requests.lock().push(request.clone());
        self.pages.lock().pop_front().unwrap_or_else(|| {
            Ok(SearchResponse {
                success: true,
                data: Vec::new(),
            })
        })
    }
}

/// Scriptable market feed for tests above the aggregator.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockMarketFeed {
    name: String,
    results: parking_lot::Mutex<std::collections::VecDeque<RateResult<MarketAggregate>>>,
    calls: parking_lot::Mutex<Vec<Option<Decimal>>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockMarketFeed {
    /// Create a new mock feed with no results scripted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Queue the outcome of the next `search` call.
    pub fn push_result(&self, result: RateResult<MarketAggregate>) {
        self.results.lock().push_back(result);
    }

    /// Filter amounts of every `search` call seen so far.
    pub fn calls(&self) -> Vec<Option<Decimal>> {
        self.calls.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl MarketFeed for MockMarketFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        filter_amount: Option<Decimal>,
        _min_required_ads: usize,
        _page_size: u32,
    ) -> RateResult<MarketAggregate> {
        self.calls.lock().push(filter_amount);
        self.results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(RateError::Connectivity("no result scripted".to_string())))
    }
}

/// Minimal aggregate for tests that only need an average price.
#[cfg(any(test, feature = "test-utils"))]
pub fn aggregate_with_average(average: Decimal) -> MarketAggregate {
    MarketAggregate {
        average_price: average,
        min_price: average,
        max_price: average,
        ad_count: 1,
        ads: Vec::new(),
        filter_amount: None,
        pages_queried: 1,
        fiat: "VES".to_string(),
        source: "MOCK".to_string(),
        fetched_at: Utc::now(),
    }
}
