//! Wire schemas for the reference-rate and marketplace endpoints.
//!
//! Every optional field defaults instead of failing: the marketplace quotes
//! numbers as strings, omits fields per advertiser, and adds new ones
//! without notice. Deserialization only fails when a required field
//! (`dollar` on the reference feed) is missing or the body is not JSON.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lenient numeric deserializers.
///
/// A value that is absent, null, an empty string, or unparseable maps to
/// `None` rather than failing the surrounding struct.
mod lenient {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    pub fn decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(decimal_from_value))
    }

    pub fn u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(|v| match v {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }))
    }

    fn decimal_from_value(value: &Value) -> Option<Decimal> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Decimal::from_str(s.trim()).ok(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        }
    }
}

/// Serializers matching upstream expectations.
mod ser {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::Serializer;

    /// The marketplace expects `transAmount` as a JSON number, not the
    /// string form `Decimal` serializes to by default.
    pub fn decimal_number_opt<S>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_f64(d.to_f64().unwrap_or(0.0)),
            None => serializer.serialize_none(),
        }
    }
}

// ─── Reference-rate endpoint ────────────────────────────────────────────────

/// Body of the official reference-rate endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceRateBody {
    /// USD to VES rate, quoted as a numeric string.
    pub dollar: Decimal,
    /// Publication date, ISO-8601.
    pub date: String,
}

// ─── Marketplace search endpoint ────────────────────────────────────────────

/// POST body for one marketplace search page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub asset: String,
    pub fiat: String,
    pub merchant_check: bool,
    pub page: u32,
    pub pay_types: Vec<String>,
    pub publisher_type: Option<String>,
    pub rows: u32,
    pub trade_type: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "ser::decimal_number_opt"
    )]
    pub trans_amount: Option<Decimal>,
}

/// Top-level marketplace search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<AdListing>,
}

/// One raw listing: the ad body plus its advertiser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdListing {
    #[serde(default)]
    pub adv: Option<AdBody>,
    #[serde(default)]
    pub advertiser: Option<AdvertiserBody>,
}

/// Ad-side fields of a listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdBody {
    #[serde(default, deserialize_with = "lenient::decimal_opt")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal_opt")]
    pub min_single_trans_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal_opt")]
    pub max_single_trans_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal_opt")]
    pub dynamic_max_single_trans_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal_opt")]
    pub surplus_amount: Option<Decimal>,
    #[serde(default)]
    pub trade_methods: Vec<TradeMethod>,
}

/// Advertiser-side fields of a listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertiserBody {
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub user_identity: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal_opt")]
    pub month_finish_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub month_order_count: Option<u32>,
}

/// One accepted payment method on an ad.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMethod {
    #[serde(default)]
    pub trade_method_name: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub pay_type: Option<String>,
}

impl TradeMethod {
    /// Best available display name for the method.
    pub fn display_name(&self) -> Option<String> {
        self.trade_method_name
            .clone()
            .or_else(|| self.identifier.clone())
            .or_else(|| self.pay_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_reference_body_accepts_numeric_string() {
        let body: ReferenceRateBody =
            serde_json::from_value(json!({"dollar": "36.5899", "date": "2024-06-01"})).unwrap();

        assert_eq!(body.dollar, dec!(36.5899));
        assert_eq!(body.date, "2024-06-01");
    }

    #[test]
    fn test_reference_body_requires_dollar() {
        let result: Result<ReferenceRateBody, _> =
            serde_json::from_value(json!({"date": "2024-06-01"}));

        assert!(result.is_err());
    }

    #[test]
    fn test_search_request_shape() {
        let request = SearchRequest {
            asset: "USDT".to_string(),
            fiat: "VES".to_string(),
            merchant_check: true,
            page: 1,
            pay_types: Vec::new(),
            publisher_type: None,
            rows: 20,
            trade_type: "SELL".to_string(),
            trans_amount: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["merchantCheck"], json!(true));
        assert_eq!(value["payTypes"], json!([]));
        assert_eq!(value["publisherType"], json!(null));
        assert_eq!(value["tradeType"], json!("SELL"));
        // Absent filter must not appear in the body at all.
        assert!(value.get("transAmount").is_none());
    }

    #[test]
    fn test_search_request_includes_filter() {
        let request = SearchRequest {
            asset: "USDT".to_string(),
            fiat: "VES".to_string(),
            merchant_check: true,
            page: 3,
            pay_types: Vec::new(),
            publisher_type: None,
            rows: 20,
            trade_type: "SELL".to_string(),
            trans_amount: Some(dec!(4000.12)),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["page"], json!(3));
        assert_eq!(value["transAmount"], json!(4000.12));
    }

    #[test]
    fn test_listing_with_string_prices_and_gaps() {
        let listing: AdListing = serde_json::from_value(json!({
            "adv": {
                "price": "42.50",
                "minSingleTransAmount": "100",
                "dynamicMaxSingleTransAmount": "9000.00",
                "surplusAmount": "1532.77",
                "tradeMethods": [
                    {"tradeMethodName": "Banesco"},
                    {"identifier": "Mercantil"}
                ],
                "classify": "mass"
            },
            "advertiser": {
                "nickName": "cambista01",
                "userType": "merchant",
                "monthFinishRate": 0.987,
                "userGrade": 2
            }
        }))
        .unwrap();

        let adv = listing.adv.unwrap();
        assert_eq!(adv.price, Some(dec!(42.50)));
        assert_eq!(adv.max_single_trans_amount, None);
        assert_eq!(adv.dynamic_max_single_trans_amount, Some(dec!(9000.00)));
        assert_eq!(
            adv.trade_methods
                .iter()
                .filter_map(TradeMethod::display_name)
                .collect::<Vec<_>>(),
            vec!["Banesco".to_string(), "Mercantil".to_string()]
        );

        let advertiser = listing.advertiser.unwrap();
        assert_eq!(advertiser.user_type.as_deref(), Some("merchant"));
        assert_eq!(advertiser.month_finish_rate, Some(dec!(0.987)));
        assert_eq!(advertiser.month_order_count, None);
    }

    #[test]
    fn test_malformed_numbers_default_to_none() {
        let body: AdBody = serde_json::from_value(json!({
            "price": "",
            "minSingleTransAmount": "n/a",
            "surplusAmount": null
        }))
        .unwrap();

        assert_eq!(body.price, None);
        assert_eq!(body.min_single_trans_amount, None);
        assert_eq!(body.surplus_amount, None);
    }

    #[test]
    fn test_response_defaults_when_fields_missing() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();

        assert!(!response.success);
        assert!(response.data.is_empty());
    }
}
