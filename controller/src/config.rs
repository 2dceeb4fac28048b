//! Calculator configuration.

use std::time::Duration;

use vescalc_rates::{MarketConfig, ReferenceConfig};

use crate::scheduler::SchedulerConfig;

/// Main calculator configuration.
#[derive(Debug, Clone, Default)]
pub struct CalculatorConfig {
    /// Reference-rate client configuration.
    pub reference: ReferenceConfig,
    /// Marketplace aggregator configuration.
    pub market: MarketConfig,
    /// Debounce and search-target configuration.
    pub scheduler: SchedulerConfig,
}

impl CalculatorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("REFERENCE_RATE_URL") {
            config.reference.endpoint = url;
        }

        if let Ok(url) = std::env::var("MARKET_SEARCH_URL") {
            config.market.endpoint = url;
        }

        if let Ok(min_ads) = std::env::var("MIN_REQUIRED_ADS") {
            if let Ok(min_ads) = min_ads.parse() {
                config.scheduler.min_required_ads = min_ads;
            }
        }

        if let Ok(millis) = std::env::var("DEBOUNCE_MS") {
            if let Ok(millis) = millis.parse() {
                config.scheduler.debounce_window = Duration::from_millis(millis);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.reference.endpoint.is_empty() {
            return Err("Reference endpoint cannot be empty".to_string());
        }

        if self.market.endpoint.is_empty() {
            return Err("Marketplace endpoint cannot be empty".to_string());
        }

        if self.market.page_cap == 0 {
            return Err("Page cap cannot be 0".to_string());
        }

        if self.scheduler.min_required_ads == 0 {
            return Err("Verified-ad target cannot be 0".to_string());
        }

        if self.scheduler.page_size == 0 || self.scheduler.page_size > self.market.max_page_size
        {
            return Err("Page size must be between 1 and the marketplace maximum".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CalculatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.debounce_window, Duration::from_millis(500));
        assert_eq!(config.market.page_cap, 100);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = CalculatorConfig::default();
        config.scheduler.min_required_ads = 0;
        assert!(config.validate().is_err());

        let mut config = CalculatorConfig::default();
        config.scheduler.page_size = 50;
        assert!(config.validate().is_err());
    }
}
