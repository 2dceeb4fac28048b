//! Rate engine error types.

use std::fmt;
use thiserror::Error;

/// Reason an aggregation produced no usable statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationReason {
    /// No verified ads were collected across all pages.
    NoVerifiedAds,
    /// Verified ads were collected but none carried a positive price.
    NoValidPrices,
}

impl fmt::Display for AggregationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationReason::NoVerifiedAds => write!(f, "no verified ads"),
            AggregationReason::NoValidPrices => write!(f, "no valid prices"),
        }
    }
}

/// Errors that can occur while acquiring rates.
#[derive(Debug, Clone, Error)]
pub enum RateError {
    /// The per-request cancellation timeout fired.
    #[error("request timed out")]
    Timeout,

    /// The transport reported a network failure.
    #[error("network failure: {0}")]
    Connectivity(String),

    /// The endpoint answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Http(u16),

    /// The body was not valid JSON or lacked required fields.
    #[error("malformed response: {0}")]
    Parse(String),

    /// The marketplace search yielded nothing aggregatable.
    #[error("aggregation failed: {0}")]
    Aggregation(AggregationReason),
}

impl RateError {
    /// Map a transport-level failure onto the taxonomy.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RateError::Timeout
        } else if let Some(status) = err.status() {
            RateError::Http(status.as_u16())
        } else if err.is_decode() {
            RateError::Parse(err.to_string())
        } else {
            RateError::Connectivity(err.to_string())
        }
    }

    /// Short user-facing message, as surfaced by the calculator UI.
    ///
    /// Technical detail stays in `Display`; this is the only text that may
    /// reach the screen.
    pub fn user_message(&self) -> String {
        match self {
            RateError::Timeout => {
                "Tiempo de espera agotado. Verifica tu conexión.".to_string()
            }
            RateError::Connectivity(_) => {
                "No se pudo conectar con el servidor.".to_string()
            }
            RateError::Http(status) => format!("Error HTTP: {}", status),
            RateError::Parse(_) => "Respuesta inválida del servidor.".to_string(),
            RateError::Aggregation(AggregationReason::NoVerifiedAds) => {
                "No se encontraron anuncios verificados".to_string()
            }
            RateError::Aggregation(AggregationReason::NoValidPrices) => {
                "No hay precios válidos entre los anuncios verificados".to_string()
            }
        }
    }
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_reason_display() {
        assert_eq!(
            RateError::Aggregation(AggregationReason::NoVerifiedAds).to_string(),
            "aggregation failed: no verified ads"
        );
        assert_eq!(
            RateError::Aggregation(AggregationReason::NoValidPrices).to_string(),
            "aggregation failed: no valid prices"
        );
    }

    #[test]
    fn test_user_messages_are_localized() {
        assert_eq!(RateError::Http(503).user_message(), "Error HTTP: 503");
        assert!(RateError::Timeout.user_message().contains("Tiempo de espera"));
        assert!(RateError::Connectivity("refused".to_string())
            .user_message()
            .contains("No se pudo conectar"));
    }
}
