//! The rate controller: the core's surface to the presentation layer.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};
use vescalc_rates::{
    convert, Conversion, FiatRateSource, MarketFeed, RateResult, SourceHealth,
};

use crate::scheduler::{RecomputeScheduler, SchedulerConfig};
use crate::state::{RatesSnapshot, RatesState};

/// Owns the rate snapshots and drives both fetch paths.
///
/// All consumers read the same state object; nothing ambient. A manual
/// refresh and a debounced recompute may overlap, in which case whichever
/// finishes last wins the snapshot (each write is atomic).
pub struct RateController {
    reference: Arc<dyn FiatRateSource>,
    market: Arc<dyn MarketFeed>,
    state: Arc<RatesState>,
    scheduler: RecomputeScheduler,
    config: SchedulerConfig,
}

impl RateController {
    /// Create a controller over the given sources.
    pub fn new(
        reference: Arc<dyn FiatRateSource>,
        market: Arc<dyn MarketFeed>,
        config: SchedulerConfig,
    ) -> Self {
        let state = Arc::new(RatesState::new());
        let scheduler = RecomputeScheduler::new(market.clone(), state.clone(), config.clone());

        Self {
            reference,
            market,
            state,
            scheduler,
            config,
        }
    }

    /// Load or refresh both rates.
    ///
    /// The reference rate is fetched first; if it fails, the marketplace is
    /// not queried. A failure records the error and leaves whatever
    /// snapshot existed before in place.
    pub async fn load_rates(&self) -> RateResult<()> {
        self.state.set_loading(true);
        self.state.clear_error();

        let result = self.load_rates_inner().await;
        if let Err(e) = &result {
            warn!(error = %e, "Rate load failed");
            self.state.set_error(e.clone());
        }

        self.state.set_loading(false);
        result
    }

    async fn load_rates_inner(&self) -> RateResult<()> {
        let fiat = self.reference.fetch_rate().await?;
        info!(value = %fiat.value, source = %fiat.source, "Reference rate loaded");
        self.state.set_fiat(fiat);

        let aggregate = self
            .market
            .search(None, self.config.min_required_ads, self.config.page_size)
            .await?;
        info!(
            ads = aggregate.ad_count,
            average = %aggregate.average_price,
            "Market aggregate loaded"
        );
        self.state.set_market(aggregate);

        Ok(())
    }

    /// Submit a raw amount-input change.
    ///
    /// Input that does not parse as a decimal is dropped at this boundary;
    /// the scheduler additionally ignores non-positive amounts and changes
    /// arriving before the reference rate exists.
    pub fn submit_amount(&self, input: &str) {
        let Ok(amount) = Decimal::from_str(input.trim()) else {
            return;
        };
        self.scheduler.amount_changed(amount);
    }

    /// Derived figures for an amount, once both snapshots exist.
    ///
    /// Recomputed from the latest snapshots on every call; nothing cached.
    pub fn conversion(&self, amount_usd: Decimal) -> Option<Conversion> {
        let fiat = self.state.fiat()?;
        let market = self.state.market()?;
        Some(convert(amount_usd, &fiat, &market))
    }

    /// Current observable state.
    pub fn snapshot(&self) -> RatesSnapshot {
        self.state.snapshot()
    }

    /// Probe the reference endpoint.
    pub async fn reference_health(&self) -> SourceHealth {
        self.reference.check_health().await
    }

    /// Cancel any pending recompute timer. In-flight requests complete.
    pub fn shutdown(&self) {
        self.scheduler.cancel_pending();
    }
}

impl Drop for RateController {
    fn drop(&mut self) {
        self.scheduler.cancel_pending();
    }
}
