//! Create a payment method from the command line.
//!
//! Run with:
//!
//! ```text
//! VIPAGO_UNSAFE_MODE=true cargo run -p create-payment-method -- cust_123 --details card.json
//! ```
//!
//! `card.json` holds the raw details in the platform's wire format. Running
//! this outside a browser puts the machine in PCI scope; use test cards only.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vipago_core::{CustomerId, NewPaymentMethodDetails};
use vipago_gateway::GatewayRegistry;
use vipago_session::{PaymentMethodSession, SessionConfig};

#[derive(Parser)]
#[command(name = "create-payment-method")]
#[command(about = "Create a Vipago payment method", long_about = None)]
struct Cli {
    /// Customer to attach the payment method to (`cust_...`).
    customer_id: CustomerId,

    /// JSON file with the raw payment-method details.
    #[arg(long, short, value_name = "PATH")]
    details: PathBuf,

    /// API base URL (default: VIPAGO_API_URL or production).
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = SessionConfig::from_env().context("Invalid configuration")?;
    if let Some(api_url) = cli.api_url {
        config = config.with_api_url(api_url).context("Invalid --api-url")?;
    }

    let raw = std::fs::read_to_string(&cli.details)
        .with_context(|| format!("Failed to read {}", cli.details.display()))?;
    let details: NewPaymentMethodDetails = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid payment-method details in {}", cli.details.display()))?;

    tracing::info!("Creating payment method for {}", cli.customer_id);
    let session = PaymentMethodSession::new(
        config,
        GatewayRegistry::with_default_gateways(reqwest::Client::new()),
    );
    let record = session
        .create_payment_method(cli.customer_id, details)
        .await
        .context("Failed to create payment method")?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
