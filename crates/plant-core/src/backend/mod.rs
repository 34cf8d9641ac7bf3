//! Shop Backend Contract
//!
//! The REST calls the checkout makes against its own backend, expressed as a
//! capability trait so the checkout can run against the real server or a
//! recording double.
//!
//! | Call | Method | Path |
//! |---|---|---|
//! | create payment intent | POST | `/create-payment-intent` |
//! | create order | POST | `/order` |
//! | adjust inventory | PATCH | `/plants/quantity/{plantId}` |

mod http;
mod memory;

pub use http::{BackendConfig, HttpBackend};
pub use memory::{BackendCall, MemoryBackend};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ClientSecret, InventoryUpdate, OrderRecord, PaymentIntentRequest, PlantId};

/// Backend client trait (Strategy pattern)
#[async_trait]
pub trait ShopBackend: Send + Sync {
    /// Ask the backend to open a payment intent for `{quantity, plantId}`
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<ClientSecret>;

    /// Persist an order for a charged payment
    async fn create_order(&self, order: &OrderRecord) -> Result<()>;

    /// Adjust stock for a plant
    async fn adjust_inventory(&self, plant_id: &PlantId, update: &InventoryUpdate) -> Result<()>;
}
