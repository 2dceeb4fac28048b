//! Reference-rate source trait and the BCV HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::{debug, warn};
use vescalc_common::{trunc2, FiatRate};

use crate::error::{RateError, RateResult};
use crate::wire::ReferenceRateBody;

/// Where the official reference rate comes from.
#[async_trait]
pub trait FiatRateSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Fetch the current official rate. No internal retry.
    async fn fetch_rate(&self) -> RateResult<FiatRate>;

    /// Probe the endpoint. Never fails; every error kind collapses into
    /// the returned message.
    async fn check_health(&self) -> SourceHealth;
}

/// Outcome of a health probe.
#[derive(Debug, Clone)]
pub struct SourceHealth {
    /// Whether the endpoint answered usably.
    pub available: bool,
    /// Human-readable status line.
    pub message: String,
}

/// Configuration for the reference-rate client.
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    /// Reference-rate endpoint URL.
    pub endpoint: String,
    /// Cancellation timeout for a rate fetch.
    pub fetch_timeout: Duration,
    /// Cancellation timeout for a health probe.
    pub health_timeout: Duration,
    /// Label attached to returned snapshots.
    pub source_label: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://bcv-api.rafnixg.dev/rates/".to_string(),
            fetch_timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(5),
            source_label: "BCV Oficial".to_string(),
        }
    }
}

/// HTTP client for the official reference-rate API.
pub struct BcvClient {
    client: Client,
    config: ReferenceConfig,
}

impl BcvClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ReferenceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn fetch_body(&self, timeout: Duration) -> RateResult<ReferenceRateBody> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(RateError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Http(status.as_u16()));
        }

        let text = response.text().await.map_err(RateError::from_transport)?;
        parse_reference_body(&text)
    }
}

#[async_trait]
impl FiatRateSource for BcvClient {
    fn name(&self) -> &str {
        &self.config.source_label
    }

    async fn fetch_rate(&self) -> RateResult<FiatRate> {
        let body = self.fetch_body(self.config.fetch_timeout).await?;
        let rate = FiatRate::new(
            trunc2(body.dollar),
            display_date(&body.date),
            body.date,
            self.config.source_label.clone(),
        );

        debug!(value = %rate.value, as_of = %rate.as_of, "Fetched reference rate");
        Ok(rate)
    }

    async fn check_health(&self) -> SourceHealth {
        match self.fetch_body(self.config.health_timeout).await {
            Ok(body) => SourceHealth {
                available: true,
                message: format!("Tasa {} del {}", body.dollar, body.date),
            },
            Err(e) => {
                warn!(error = %e, "Reference endpoint unavailable");
                SourceHealth {
                    available: false,
                    message: format!("API no disponible: {}", e.user_message()),
                }
            }
        }
    }
}

fn parse_reference_body(text: &str) -> RateResult<ReferenceRateBody> {
    serde_json::from_str(text).map_err(|e| RateError::Parse(e.to_string()))
}

/// Format an upstream ISO-8601 date for display (`dd/mm/yyyy`).
///
/// Falls back to the raw string when the upstream format is unexpected;
/// an odd date must not fail an otherwise good rate.
fn display_date(iso: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(iso) {
        return dt.format("%d/%m/%Y").to_string();
    }
    iso.to_string()
}

/// Scriptable reference source for tests.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockFiatSource {
    name: String,
    rate: parking_lot::Mutex<Option<FiatRate>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockFiatSource {
    /// Create a new mock source with no rate scripted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rate: parking_lot::Mutex::new(None),
        }
    }

    /// Script the rate returned by `fetch_rate`.
    pub fn set_rate(&self, rate: FiatRate) {
        *self.rate.lock() = Some(rate);
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl FiatRateSource for MockFiatSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rate(&self) -> RateResult<FiatRate> {
        self.rate
            .lock()
            .clone()
            .ok_or_else(|| RateError::Connectivity("no rate scripted".to_string()))
    }

    async fn check_health(&self) -> SourceHealth {
        match self.fetch_rate().await {
            Ok(rate) => SourceHealth {
                available: true,
                message: format!("Tasa {} del {}", rate.value, rate.iso_date),
            },
            Err(e) => SourceHealth {
                available: false,
                message: format!("API no disponible: {}", e.user_message()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_valid_body() {
        let body = parse_reference_body(r#"{"dollar": "36.5899", "date": "2024-06-01"}"#).unwrap();

        assert_eq!(body.dollar, dec!(36.5899));
        assert_eq!(trunc2(body.dollar), dec!(36.58));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let result = parse_reference_body(r#"{"date": "2024-06-01"}"#);

        assert!(matches!(result, Err(RateError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let result = parse_reference_body("<html>maintenance</html>");

        assert!(matches!(result, Err(RateError::Parse(_))));
    }

    #[test]
    fn test_display_date_formats() {
        assert_eq!(display_date("2024-06-01"), "01/06/2024");
        assert_eq!(display_date("2024-06-01T04:00:00+00:00"), "01/06/2024");
        // Unexpected formats pass through untouched.
        assert_eq!(display_date("junio"), "junio");
    }

    #[tokio::test]
    async fn test_mock_source() {
        let source = MockFiatSource::new("test");

        let health = source.check_health().await;
        assert!(!health.available);

        source.set_rate(FiatRate::new(dec!(40.00), "01/06/2024", "2024-06-01", "TEST"));

        let rate = source.fetch_rate().await.unwrap();
        assert_eq!(rate.value, dec!(40.00));

        let health = source.check_health().await;
        assert!(health.available);
        assert!(health.message.contains("40.00"));
    }
}
