//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use plant_core::{
    InventoryUpdate, OrderCreated, OrderRecord, PaymentIntentRequest, PaymentIntentResponse, Plant,
    PlantId, ShopError, StoredOrder,
};
use plant_payments::PaymentError;

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub email: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn shop_error(e: ShopError) -> ApiError {
    let (status, code) = match &e {
        ShopError::PlantNotFound(_) => (StatusCode::NOT_FOUND, "PLANT_NOT_FOUND"),
        ShopError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, "INVALID_QUANTITY"),
        ShopError::InsufficientStock { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "SHOP_ERROR"),
    };
    api_error(status, e.user_message(), code)
}

fn payment_error(e: &PaymentError) -> ApiError {
    tracing::error!("Payment intent error: {}", e);
    let status = if e.is_retryable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::BAD_GATEWAY
    };
    api_error(status, e.user_message(), "PAYMENT_ERROR")
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.intents.is_some(),
    })
}

/// All plant listings
pub async fn list_plants(State(state): State<AppState>) -> Json<Vec<Plant>> {
    Json(state.store.plants().await)
}

/// One plant listing
pub async fn get_plant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Plant>, ApiError> {
    state
        .store
        .plant(&PlantId::new(id))
        .await
        .map(Json)
        .map_err(shop_error)
}

/// Open a payment intent for `quantity` units of a plant.
///
/// The amount is computed here from the stored price; the client never
/// supplies it.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let Some(intents) = &state.intents else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Payments not configured",
            "PAYMENTS_DISABLED",
        ));
    };

    // Stock is only checked here; the order itself reserves nothing.
    let amount_cents = state
        .store
        .quote(&payload.plant_id, payload.quantity)
        .await
        .map_err(|e| match e {
            ShopError::InsufficientStock { .. } => {
                api_error(StatusCode::BAD_REQUEST, e.user_message(), "INSUFFICIENT_STOCK")
            }
            other => shop_error(other),
        })?;

    let client_secret = intents
        .create_payment_intent(amount_cents, &payload.plant_id, payload.quantity)
        .await
        .map_err(|e| payment_error(&e))?;

    Ok(Json(PaymentIntentResponse { client_secret }))
}

/// Persist a paid order for a listed plant
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<OrderRecord>,
) -> Result<Json<OrderCreated>, ApiError> {
    if payload.transaction_id.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing transaction id",
            "MISSING_TRANSACTION",
        ));
    }

    let order = state
        .store
        .insert_order(payload)
        .await
        .map_err(shop_error)?;
    tracing::info!(
        order_id = %order.id,
        transaction_id = %order.record.transaction_id,
        plant_id = %order.record.purchase.plant_id,
        "Order stored"
    );

    Ok(Json(OrderCreated {
        inserted_id: order.id,
    }))
}

/// Increase or decrease a plant's stock
pub async fn update_plant_quantity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<InventoryUpdate>,
) -> Result<Json<QuantityResponse>, ApiError> {
    let quantity = state
        .store
        .adjust_quantity(&PlantId::new(id), &payload)
        .await
        .map_err(shop_error)?;

    Ok(Json(QuantityResponse { quantity }))
}

/// Orders, optionally for one customer
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Json<Vec<StoredOrder>> {
    Json(state.store.orders(query.email.as_deref()).await)
}

/// Sales chart for the dashboard
pub async fn dashboard_chart(State(state): State<AppState>) -> impl IntoResponse {
    let data = state.store.chart_data().await;
    (
        [(header::CONTENT_TYPE, "image/svg+xml")],
        state.chart.render(&data),
    )
}
