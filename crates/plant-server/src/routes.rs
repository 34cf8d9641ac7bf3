//! Router

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    create_order, create_payment_intent, dashboard_chart, get_plant, health_check, list_orders,
    list_plants, update_plant_quantity,
};
use crate::state::AppState;

/// Build the HTTP surface over `state`
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        // Catalog
        .route("/plants", get(list_plants))
        .route("/plants/{id}", get(get_plant))
        .route("/plants/quantity/{id}", patch(update_plant_quantity))
        // Checkout
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/order", post(create_order))
        .route("/orders", get(list_orders))
        // Dashboard
        .route("/dashboard/chart.svg", get(dashboard_chart))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
