//! Domain Models
//!
//! Core data types shared by the storefront checkout and the shop backend.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Plant identifier as issued by the backend
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantId(String);

impl PlantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Buyer identity attached to a purchase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Everything the checkout needs to know about one purchase.
///
/// Immutable for the duration of one checkout attempt; supplying a different
/// value invalidates any payment intent fetched for the previous one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInfo {
    pub plant_id: PlantId,

    /// Units being bought (always positive)
    pub quantity: u32,

    /// Total price shown on the pay button
    pub price: Decimal,

    pub customer: Customer,

    /// Delivery address entered in the purchase modal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Seller email copied from the plant listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
}

impl PurchaseInfo {
    pub fn new(
        plant_id: impl Into<PlantId>,
        quantity: u32,
        price: Decimal,
        customer: Customer,
    ) -> Self {
        Self {
            plant_id: plant_id.into(),
            quantity,
            price,
            customer,
            address: None,
            seller: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_seller(mut self, seller: impl Into<String>) -> Self {
        self.seller = Some(seller.into());
        self
    }

    /// Body of the create-payment-intent call
    pub fn intent_request(&self) -> PaymentIntentRequest {
        PaymentIntentRequest {
            quantity: self.quantity,
            plant_id: self.plant_id.clone(),
        }
    }
}

/// `POST /create-payment-intent` payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    pub quantity: u32,
    pub plant_id: PlantId,
}

/// `POST /create-payment-intent` response
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: ClientSecret,
}

/// Payment intent secret issued by the backend.
///
/// Single-use per checkout attempt. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Payment intent id embedded in the secret (`pi_123_secret_abc` → `pi_123`)
    pub fn intent_id(&self) -> &str {
        self.0.split_once("_secret_").map_or(self.0.as_str(), |(id, _)| id)
    }
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClientSecret({}_secret_***)", self.intent_id())
    }
}

/// Order as posted by the checkout: purchase fields plus the provider's
/// transaction identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(flatten)]
    pub purchase: PurchaseInfo,

    pub transaction_id: String,
}

impl OrderRecord {
    pub fn new(purchase: PurchaseInfo, transaction_id: impl Into<String>) -> Self {
        Self {
            purchase,
            transaction_id: transaction_id.into(),
        }
    }
}

/// Order lifecycle on the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Delivered,
    Cancelled,
}

/// An order once the backend has persisted it
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOrder {
    #[serde(rename = "_id")]
    pub id: uuid::Uuid,

    #[serde(flatten)]
    pub record: OrderRecord,

    #[serde(default)]
    pub status: OrderStatus,

    pub created_at: DateTime<Utc>,
}

impl StoredOrder {
    pub fn new(record: OrderRecord) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            record,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// `POST /order` response
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub inserted_id: uuid::Uuid,
}

/// Direction of an inventory adjustment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockChange {
    Increase,
    Decrease,
}

/// `PATCH /plants/quantity/{plantId}` payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdate {
    pub quantity_to_update: u32,
    pub status: StockChange,
}

impl InventoryUpdate {
    pub fn decrease(quantity: u32) -> Self {
        Self {
            quantity_to_update: quantity,
            status: StockChange::Decrease,
        }
    }

    pub fn increase(quantity: u32) -> Self {
        Self {
            quantity_to_update: quantity,
            status: StockChange::Increase,
        }
    }
}

/// A plant listing
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    #[serde(rename = "_id")]
    pub id: PlantId,

    pub name: String,

    pub category: String,

    /// Unit price in USD
    pub price: Decimal,

    /// Units in stock
    pub quantity: u32,

    #[serde(default)]
    pub seller: Option<String>,
}

impl Plant {
    pub fn new(
        id: impl Into<PlantId>,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: "Indoor".into(),
            price,
            quantity,
            seller: None,
        }
    }

    /// Charge for `quantity` units, in cents
    pub fn amount_cents(&self, quantity: u32) -> Option<i64> {
        use rust_decimal::prelude::ToPrimitive;

        (self.price * Decimal::from(quantity) * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
    }
}
