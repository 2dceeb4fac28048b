//! Debounced recompute scheduling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vescalc_common::{round2, MarketAggregate};
use vescalc_rates::{MarketFeed, RateResult};

use crate::state::{RatesState, SchedulerPhase};

/// Timing and search parameters for amount-driven recomputes.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Quiet period after the last qualifying amount change.
    pub debounce_window: Duration,
    /// Verified-ad target per search.
    pub min_required_ads: usize,
    /// Rows requested per marketplace page.
    pub page_size: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(500),
            min_required_ads: 5,
            page_size: 20,
        }
    }
}

struct PendingTimer {
    seq: u64,
    handle: JoinHandle<()>,
}

/// Debounces amount changes and drives the marketplace re-search, falling
/// back to an unfiltered search when the filtered one fails.
///
/// At most one timer is pending at any time, enforced by cancel-and-replace
/// on each qualifying change. A search that has already passed the debounce
/// window runs to completion even if newer changes arrive; whichever fetch
/// finishes last wins the snapshot.
pub struct RecomputeScheduler {
    market: Arc<dyn MarketFeed>,
    state: Arc<RatesState>,
    config: SchedulerConfig,
    pending: Arc<Mutex<Option<PendingTimer>>>,
    seq: AtomicU64,
}

impl RecomputeScheduler {
    /// Create a scheduler over the given feed and state.
    pub fn new(
        market: Arc<dyn MarketFeed>,
        state: Arc<RatesState>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            market,
            state,
            config,
            pending: Arc::new(Mutex::new(None)),
            seq: AtomicU64::new(0),
        }
    }

    /// Handle an amount-input change.
    ///
    /// Non-positive amounts are ignored, as are changes arriving before a
    /// reference rate exists. Each accepted change restarts the single
    /// debounce timer.
    pub fn amount_changed(&self, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        if self.state.fiat().is_none() {
            return;
        }

        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let market = self.market.clone();
        let state = self.state.clone();
        let config = self.config.clone();
        let pending = self.pending.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(config.debounce_window).await;

            // Claim the pending slot; a newer change may already have
            // replaced this timer. Once claimed, the search can no longer
            // be cancelled.
            {
                let mut slot = pending.lock();
                match slot.as_ref() {
                    Some(timer) if timer.seq == seq => {
                        *slot = None;
                    }
                    _ => return,
                }
            }

            recompute(market, state, &config, amount).await;
        });

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.handle.abort();
            debug!(%amount, "Superseded pending recompute");
        }
        *pending = Some(PendingTimer { seq, handle });
        drop(pending);

        self.state.set_phase(SchedulerPhase::Debouncing);
    }

    /// Cancel any pending debounce timer. In-flight searches complete.
    pub fn cancel_pending(&self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.handle.abort();
            debug!("Cancelled pending recompute");
        }
    }

    /// Whether a debounce timer is currently pending.
    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl Drop for RecomputeScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.handle.abort();
        }
    }
}

async fn recompute(
    market: Arc<dyn MarketFeed>,
    state: Arc<RatesState>,
    config: &SchedulerConfig,
    amount: Decimal,
) {
    // The reference rate may have been refreshed since the change was
    // queued; the filter is derived from whatever is current when the
    // timer fires.
    let Some(fiat) = state.fiat() else { return };
    let filter = round2(amount * fiat.value);

    state.set_phase(SchedulerPhase::Fetching);
    state.set_market_refreshing(true);

    match search_with_fallback(&market, config, filter).await {
        Ok(aggregate) => {
            state.set_market(aggregate);
            state.clear_error();
            state.set_phase(SchedulerPhase::Idle);
        }
        Err(e) => {
            warn!(error = %e, "Amount-driven recompute failed");
            state.set_error(e);
            state.set_phase(SchedulerPhase::Error);
        }
    }

    state.set_market_refreshing(false);
}

/// Filtered search with exactly one unfiltered fallback.
async fn search_with_fallback(
    market: &Arc<dyn MarketFeed>,
    config: &SchedulerConfig,
    filter: Decimal,
) -> RateResult<MarketAggregate> {
    let first = market
        .search(Some(filter), config.min_required_ads, config.page_size)
        .await;

    match first {
        Ok(aggregate) => Ok(aggregate),
        Err(e) => {
            warn!(error = %e, %filter, "Filtered search failed, retrying unfiltered");
            market
                .search(None, config.min_required_ads, config.page_size)
                .await
        }
    }
}
