//! Shared rate snapshot state.

use parking_lot::RwLock;
use vescalc_common::{FiatRate, MarketAggregate};
use vescalc_rates::RateError;

/// Where the recompute scheduler currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerPhase {
    /// Nothing pending.
    #[default]
    Idle,
    /// An amount change is waiting out the debounce window.
    Debouncing,
    /// A marketplace search is in flight.
    Fetching,
    /// The last recompute failed; the previous snapshot is still shown.
    Error,
}

impl SchedulerPhase {
    /// Check if nothing is pending or in flight.
    pub fn is_idle(&self) -> bool {
        matches!(self, SchedulerPhase::Idle)
    }

    /// Check if a recompute is pending or in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, SchedulerPhase::Debouncing | SchedulerPhase::Fetching)
    }

    /// Check if the last recompute failed.
    pub fn is_error(&self) -> bool {
        matches!(self, SchedulerPhase::Error)
    }
}

/// Point-in-time view of the observable state, handed to the
/// presentation layer.
#[derive(Debug, Clone)]
pub struct RatesSnapshot {
    /// Current reference rate, absent until first loaded.
    pub fiat: Option<FiatRate>,
    /// Current marketplace aggregate, absent until first loaded.
    pub market: Option<MarketAggregate>,
    /// Initial load or manual refresh in progress.
    pub loading: bool,
    /// Amount-driven marketplace refetch in progress.
    pub market_refreshing: bool,
    /// Recompute scheduler phase.
    pub phase: SchedulerPhase,
    /// Last surfaced error, if any.
    pub last_error: Option<RateError>,
}

#[derive(Debug, Default)]
struct StateInner {
    fiat: Option<FiatRate>,
    market: Option<MarketAggregate>,
    loading: bool,
    market_refreshing: bool,
    phase: SchedulerPhase,
    last_error: Option<RateError>,
}

/// The single shared mutable state: both rate snapshots plus the flags the
/// UI observes. Snapshots are replaced wholesale, never partially mutated;
/// a failed fetch leaves the previous one in place.
pub struct RatesState {
    inner: RwLock<StateInner>,
}

impl RatesState {
    /// Create empty state: nothing loaded yet.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StateInner::default()),
        }
    }

    /// Clone out the current observable view.
    pub fn snapshot(&self) -> RatesSnapshot {
        let inner = self.inner.read();
        RatesSnapshot {
            fiat: inner.fiat.clone(),
            market: inner.market.clone(),
            loading: inner.loading,
            market_refreshing: inner.market_refreshing,
            phase: inner.phase,
            last_error: inner.last_error.clone(),
        }
    }

    /// Current reference rate, if loaded.
    pub fn fiat(&self) -> Option<FiatRate> {
        self.inner.read().fiat.clone()
    }

    /// Current marketplace aggregate, if loaded.
    pub fn market(&self) -> Option<MarketAggregate> {
        self.inner.read().market.clone()
    }

    /// Current scheduler phase.
    pub fn phase(&self) -> SchedulerPhase {
        self.inner.read().phase
    }

    /// Last surfaced error, if any.
    pub fn last_error(&self) -> Option<RateError> {
        self.inner.read().last_error.clone()
    }

    pub(crate) fn set_fiat(&self, rate: FiatRate) {
        self.inner.write().fiat = Some(rate);
    }

    pub(crate) fn set_market(&self, aggregate: MarketAggregate) {
        self.inner.write().market = Some(aggregate);
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.inner.write().loading = loading;
    }

    pub(crate) fn set_market_refreshing(&self, refreshing: bool) {
        self.inner.write().market_refreshing = refreshing;
    }

    pub(crate) fn set_phase(&self, phase: SchedulerPhase) {
        self.inner.write().phase = phase;
    }

    pub(crate) fn set_error(&self, error: RateError) {
        self.inner.write().last_error = Some(error);
    }

    pub(crate) fn clear_error(&self) {
        self.inner.write().last_error = None;
    }
}

impl Default for RatesState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use vescalc_rates::aggregate_with_average;

    #[test]
    fn test_phase_predicates() {
        assert!(SchedulerPhase::Idle.is_idle());
        assert!(SchedulerPhase::Debouncing.is_busy());
        assert!(SchedulerPhase::Fetching.is_busy());
        assert!(SchedulerPhase::Error.is_error());
        assert!(!SchedulerPhase::Error.is_busy());
    }

    #[test]
    fn test_snapshot_starts_empty() {
        let state = RatesState::new();
        let snapshot = state.snapshot();

        assert!(snapshot.fiat.is_none());
        assert!(snapshot.market.is_none());
        assert!(!snapshot.loading);
        assert!(snapshot.phase.is_idle());
        assert!(snapshot.last_error.is_none());
    }

    #[test]
    fn test_market_replaced_wholesale() {
        let state = RatesState::new();

        state.set_market(aggregate_with_average(dec!(42.00)));
        state.set_market(aggregate_with_average(dec!(43.00)));

        assert_eq!(state.market().unwrap().average_price, dec!(43.00));
    }
}
