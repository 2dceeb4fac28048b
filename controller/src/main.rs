//! Vescalc CLI
//!
//! Reference consumer for the calculator core: loads both rates, then reads
//! USD amounts from stdin and prints the derived conversion, the way a
//! mobile screen would render it.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vescalc_common::round2;
use vescalc_controller::{CalculatorConfig, RateController};
use vescalc_rates::{BcvClient, MarketAggregator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting vescalc");

    // Load configuration
    let config = CalculatorConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let reference = Arc::new(BcvClient::new(config.reference.clone()));
    let market = Arc::new(MarketAggregator::over_http(config.market.clone()));
    let controller = RateController::new(reference, market, config.scheduler.clone());

    if let Err(e) = controller.load_rates().await {
        error!(error = %e, "Initial rate load failed");
    }
    print_rates(&controller);

    println!("Monto en USD ('r' actualiza tasas, 'h' estado del API, 'q' sale):");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim().to_string();
        match input.as_str() {
            "q" => break,
            "r" => {
                if let Err(e) = controller.load_rates().await {
                    error!(error = %e, "Refresh failed");
                }
                print_rates(&controller);
            }
            "h" => {
                let health = controller.reference_health().await;
                println!(
                    "{} {}",
                    if health.available { "✓" } else { "✗" },
                    health.message
                );
            }
            _ => {
                controller.submit_amount(&input);
                if let Ok(amount) = Decimal::from_str(&input) {
                    print_conversion(&controller, amount);
                }
            }
        }
    }

    controller.shutdown();
    info!("vescalc shutdown complete");
    Ok(())
}

fn print_rates(controller: &RateController) {
    let snapshot = controller.snapshot();

    if let Some(fiat) = &snapshot.fiat {
        println!("Tasa {}: {} Bs ({})", fiat.source, fiat.value, fiat.as_of);
    }
    if let Some(market) = &snapshot.market {
        println!(
            "Tasa {}: {} Bs ({} anuncios, rango {} - {} Bs)",
            market.source, market.average_price, market.ad_count, market.min_price, market.max_price
        );
    }
    if let Some(error) = &snapshot.last_error {
        println!("⚠️  {}", error.user_message());
    }
}

fn print_conversion(controller: &RateController, amount: Decimal) {
    let Some(figures) = controller.conversion(amount) else {
        println!("Tasas aún no disponibles");
        return;
    };

    println!(
        "{} USD ≈ {} Bs (BCV) → vender {} USDT",
        amount, figures.fiat_equivalent, figures.crypto_units_needed
    );
    println!(
        "Diferencia de tasas: {} Bs ({}%)",
        round2(figures.rate_delta),
        round2(figures.rate_delta_percent)
    );
}
