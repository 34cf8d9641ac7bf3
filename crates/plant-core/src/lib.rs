//! # plant-core
//!
//! Domain model, backend contract and dashboard chart for the plant shop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       plant-core                          │
//! │  ┌─────────────┐  ┌─────────────────┐  ┌──────────────┐  │
//! │  │   Models    │  │   ShopBackend   │  │ ComposedChart│  │
//! │  │ (purchase,  │──│   (Strategy)    │  │  (SVG view)  │  │
//! │  │  order)     │  │ Http / Memory   │  │              │  │
//! │  └─────────────┘  └─────────────────┘  └──────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ShopBackend` trait is the REST contract the checkout consumes. The
//! HTTP implementation talks to `plant-server`; the in-memory one records
//! every call so the checkout ordering can be asserted in tests.

pub mod backend;
pub mod chart;
pub mod error;
pub mod model;

pub use backend::{HttpBackend, MemoryBackend, ShopBackend};
pub use chart::{ChartDataPoint, ComposedChart};
pub use error::{Result, ShopError};
pub use model::{
    ClientSecret, Customer, InventoryUpdate, OrderCreated, OrderRecord, OrderStatus,
    PaymentIntentRequest, PaymentIntentResponse, Plant, PlantId, PurchaseInfo, StockChange,
    StoredOrder,
};
