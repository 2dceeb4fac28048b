//! Rate snapshot types shared across the calculator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Official reference rate published by the monetary authority.
///
/// Immutable once constructed; a successful fetch replaces the whole
/// snapshot, a failed fetch leaves the previous one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiatRate {
    /// USD to VES rate, truncated to two decimals.
    pub value: Decimal,
    /// Publication date formatted for display (`dd/mm/yyyy`).
    pub as_of: String,
    /// Publication date as reported upstream (ISO-8601).
    pub iso_date: String,
    /// Human-readable source label.
    pub source: String,
    /// When this snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl FiatRate {
    /// Create a new reference-rate snapshot stamped with the current time.
    pub fn new(
        value: Decimal,
        as_of: impl Into<String>,
        iso_date: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            value,
            as_of: as_of.into(),
            iso_date: iso_date.into(),
            source: source.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Whether the rate is usable as a conversion basis.
    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }
}

/// Tier of a marketplace counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterpartyType {
    /// Merchant-tier (verified) advertiser.
    Merchant,
    /// Anything else the marketplace reports.
    Other,
}

impl CounterpartyType {
    /// Parse the marketplace's `userType` field.
    pub fn from_user_type(user_type: Option<&str>) -> Self {
        match user_type {
            Some("merchant") => CounterpartyType::Merchant,
            _ => CounterpartyType::Other,
        }
    }
}

/// One marketplace listing, mapped from a raw search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAd {
    /// Advertiser display name.
    pub counterparty: String,
    /// Declared counterparty tier.
    pub counterparty_type: CounterpartyType,
    /// Merchant tier or explicitly verified identity.
    pub is_verified: bool,
    /// 30-day completion rate, when reported.
    pub month_finish_rate: Option<Decimal>,
    /// 30-day order count, when reported.
    pub month_order_count: Option<u32>,
    /// Quoted unit price (VES per USDT).
    pub unit_price: Decimal,
    /// Minimum accepted trade amount in fiat.
    pub min_trade_amount: Decimal,
    /// Maximum accepted trade amount in fiat.
    pub max_trade_amount: Decimal,
    /// Units the advertiser has available.
    pub available_supply: Decimal,
    /// Payment method names, in marketplace order.
    pub payment_methods: Vec<String>,
}

impl MarketAd {
    /// Whether a fiat amount falls inside the ad's trade limits.
    pub fn fits_amount(&self, amount: Decimal) -> bool {
        amount >= self.min_trade_amount && amount <= self.max_trade_amount
    }
}

/// Aggregated price statistics over verified marketplace listings.
///
/// Invariant: `min_price <= average_price <= max_price`, and `ad_count >= 1`
/// (empty result sets fail upstream instead of producing an aggregate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAggregate {
    /// Arithmetic mean over positive unit prices, truncated to two decimals.
    pub average_price: Decimal,
    /// Lowest positive unit price seen.
    pub min_price: Decimal,
    /// Highest positive unit price seen.
    pub max_price: Decimal,
    /// Number of priced ads behind the statistics.
    pub ad_count: usize,
    /// All collected ads, in marketplace response order.
    pub ads: Vec<MarketAd>,
    /// Amount filter the search was performed with, if any.
    pub filter_amount: Option<Decimal>,
    /// Pages consumed before the search stopped.
    pub pages_queried: u32,
    /// Fiat currency the prices are quoted in.
    pub fiat: String,
    /// Human-readable source label.
    pub source: String,
    /// When this snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl MarketAggregate {
    /// Spread between the best and worst observed price.
    pub fn spread(&self) -> Decimal {
        self.max_price - self.min_price
    }

    /// The first ad in marketplace order, i.e. the best-priced listing.
    pub fn best_ad(&self) -> Option<&MarketAd> {
        self.ads.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_ad(price: Decimal, min: Decimal, max: Decimal) -> MarketAd {
        MarketAd {
            counterparty: "tester".to_string(),
            counterparty_type: CounterpartyType::Merchant,
            is_verified: true,
            month_finish_rate: Some(dec!(0.98)),
            month_order_count: Some(120),
            unit_price: price,
            min_trade_amount: min,
            max_trade_amount: max,
            available_supply: dec!(1500),
            payment_methods: vec!["Banesco".to_string()],
        }
    }

    #[test]
    fn test_counterparty_type_parsing() {
        assert_eq!(
            CounterpartyType::from_user_type(Some("merchant")),
            CounterpartyType::Merchant
        );
        assert_eq!(
            CounterpartyType::from_user_type(Some("user")),
            CounterpartyType::Other
        );
        assert_eq!(
            CounterpartyType::from_user_type(None),
            CounterpartyType::Other
        );
    }

    #[test]
    fn test_ad_fits_amount() {
        let ad = make_ad(dec!(42.50), dec!(100), dec!(5000));

        assert!(ad.fits_amount(dec!(100)));
        assert!(ad.fits_amount(dec!(5000)));
        assert!(!ad.fits_amount(dec!(99.99)));
        assert!(!ad.fits_amount(dec!(5000.01)));
    }

    #[test]
    fn test_aggregate_spread_and_best_ad() {
        let ads = vec![
            make_ad(dec!(42.10), dec!(100), dec!(5000)),
            make_ad(dec!(42.90), dec!(50), dec!(2000)),
        ];
        let aggregate = MarketAggregate {
            average_price: dec!(42.50),
            min_price: dec!(42.10),
            max_price: dec!(42.90),
            ad_count: 2,
            ads,
            filter_amount: None,
            pages_queried: 1,
            fiat: "VES".to_string(),
            source: "Binance P2P".to_string(),
            fetched_at: Utc::now(),
        };

        assert_eq!(aggregate.spread(), dec!(0.80));
        assert_eq!(aggregate.best_ad().unwrap().unit_price, dec!(42.10));
    }
}
