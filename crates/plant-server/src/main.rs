//! plant-shop HTTP Server
//!
//! Axum-based backend for the storefront: plant catalog, payment intents,
//! order persistence, inventory and the dashboard sales chart.

mod handlers;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plant_payments::{IntentIssuer, StripeClient};

use crate::state::AppState;
use crate::store::ShopStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize payments
    let intents: Option<Arc<dyn IntentIssuer>> = match StripeClient::from_env() {
        Ok(client) => {
            tracing::info!("✓ Stripe configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("⚠ Stripe not configured - payment intents disabled ({})", e);
            tracing::warn!("  Set STRIPE_SECRET_KEY in .env");
            None
        }
    };

    let store = ShopStore::with_demo_plants().await;
    tracing::info!("Seeded {} plants", store.plants().await.len());

    let app = routes::router(AppState::new(store, intents));

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🌱 plant-shop server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET   /health                    - Health check");
    tracing::info!("  GET   /plants                    - List plants");
    tracing::info!("  GET   /plants/{{id}}               - Plant details");
    tracing::info!("  PATCH /plants/quantity/{{id}}      - Adjust stock");
    tracing::info!("  POST  /create-payment-intent     - Open payment intent");
    tracing::info!("  POST  /order                     - Record paid order");
    tracing::info!("  GET   /orders?email=             - Customer orders");
    tracing::info!("  GET   /dashboard/chart.svg       - Sales chart");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
