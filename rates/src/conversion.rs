//! Deriving display figures from the two rate snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vescalc_common::{round2, FiatRate, MarketAggregate};

/// Figures derived from a USD amount and the current rate snapshots.
///
/// Never persisted; recomputed on demand from the latest snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// Bolívars obtained at the official reference rate.
    pub fiat_equivalent: Decimal,
    /// USDT that must be sold at the marketplace average to cover it.
    pub crypto_units_needed: Decimal,
    /// Marketplace average minus the reference rate.
    pub rate_delta: Decimal,
    /// Delta as a percentage of the reference rate.
    pub rate_delta_percent: Decimal,
}

/// Pure derivation: no side effects, no I/O, deterministic given its inputs.
pub fn convert(amount_usd: Decimal, fiat: &FiatRate, market: &MarketAggregate) -> Conversion {
    let fiat_equivalent = round2(amount_usd * fiat.value);

    let crypto_units_needed = if market.average_price > Decimal::ZERO {
        round2(fiat_equivalent / market.average_price)
    } else {
        Decimal::ZERO
    };

    let rate_delta = market.average_price - fiat.value;
    let rate_delta_percent = if fiat.value > Decimal::ZERO {
        (rate_delta / fiat.value) * Decimal::from(100)
    } else {
        Decimal::ZERO
    };

    Conversion {
        fiat_equivalent,
        crypto_units_needed,
        rate_delta,
        rate_delta_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn fiat(value: Decimal) -> FiatRate {
        FiatRate::new(value, "01/06/2024", "2024-06-01", "TEST")
    }

    fn market(average: Decimal) -> MarketAggregate {
        MarketAggregate {
            average_price: average,
            min_price: average,
            max_price: average,
            ad_count: 1,
            ads: Vec::new(),
            filter_amount: None,
            pages_queried: 1,
            fiat: "VES".to_string(),
            source: "TEST".to_string(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_worked_example() {
        let result = convert(dec!(100), &fiat(dec!(40.00)), &market(dec!(42.50)));

        assert_eq!(result.fiat_equivalent, dec!(4000.00));
        assert_eq!(result.crypto_units_needed, dec!(94.12));
        assert_eq!(result.rate_delta, dec!(2.50));
        assert_eq!(result.rate_delta_percent, dec!(6.25));
    }

    #[test]
    fn test_zero_market_price_guards_division() {
        let result = convert(dec!(100), &fiat(dec!(40.00)), &market(Decimal::ZERO));

        assert_eq!(result.crypto_units_needed, Decimal::ZERO);
        assert_eq!(result.rate_delta, dec!(-40.00));
    }

    #[test]
    fn test_zero_fiat_rate_guards_percentage() {
        let result = convert(dec!(100), &fiat(Decimal::ZERO), &market(dec!(42.50)));

        assert_eq!(result.fiat_equivalent, Decimal::ZERO);
        assert_eq!(result.rate_delta_percent, Decimal::ZERO);
    }

    #[test]
    fn test_negative_delta_when_market_below_reference() {
        let result = convert(dec!(50), &fiat(dec!(40.00)), &market(dec!(38.00)));

        assert_eq!(result.rate_delta, dec!(-2.00));
        assert_eq!(result.rate_delta_percent, dec!(-5.00));
    }
}
