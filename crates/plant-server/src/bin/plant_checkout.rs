//! Headless checkout
//!
//! Buys a plant against a running plant-server using Stripe test cards:
//!
//! ```text
//! plant-checkout monstera --quantity 2 --price 80 \
//!     --name "Ada" --email ada@example.com --card 4242424242424242
//! ```

use std::sync::Arc;

use clap::Parser;
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plant_core::{Customer, HttpBackend, PurchaseInfo};
use plant_payments::{
    CardDetails, CheckoutConfig, CheckoutOrchestrator, CheckoutOutcome, LogUi, StaticElements,
    StripeElements,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Plant to buy
    plant_id: String,

    /// Units to buy
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Total shown on the pay button, in USD
    #[arg(long)]
    price: Decimal,

    /// Customer name
    #[arg(long)]
    name: String,

    /// Customer email
    #[arg(long)]
    email: String,

    /// Delivery address
    #[arg(long)]
    address: Option<String>,

    /// Card number
    #[arg(long, default_value = "4242424242424242")]
    card: String,

    #[arg(long, default_value_t = 12)]
    exp_month: u32,

    #[arg(long, default_value_t = 2034)]
    exp_year: i32,

    #[arg(long, default_value = "123")]
    cvc: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let backend = Arc::new(HttpBackend::from_env()?);
    let provider = Arc::new(StripeElements::from_env()?);
    let card = CardDetails::new(&cli.card, cli.exp_month, cli.exp_year, &cli.cvc);

    let mut purchase = PurchaseInfo::new(
        cli.plant_id.as_str(),
        cli.quantity,
        cli.price,
        Customer::new(cli.name, cli.email),
    );
    if let Some(address) = cli.address {
        purchase = purchase.with_address(address);
    }

    let mut checkout =
        CheckoutOrchestrator::new(backend, Arc::new(LogUi), CheckoutConfig::default())
            .with_payments(provider, Arc::new(StaticElements::mounted(card)));

    if !checkout.supply_purchase(purchase).await {
        anyhow::bail!("could not open a payment intent: {:?}", checkout.state());
    }
    tracing::info!("{}", checkout.pay_label());

    match checkout.submit().await {
        CheckoutOutcome::Succeeded { transaction_id } => {
            println!("Order placed: {transaction_id}");
            Ok(())
        }
        CheckoutOutcome::Stalled { status } => {
            checkout.cancel();
            anyhow::bail!("payment not completed (status: {status})")
        }
        CheckoutOutcome::Rejected(reason) => anyhow::bail!("submit rejected: {reason:?}"),
        CheckoutOutcome::Failed(failure) => anyhow::bail!("checkout failed: {failure:?}"),
    }
}
