//! # plant-payments
//!
//! Card payments and checkout orchestration for the plant shop.
//!
//! ## Payment Flow
//!
//! The storefront pays through Stripe Elements: card input stays inside the
//! provider's widget, the backend opens a payment intent, and the storefront
//! confirms it with the card.
//!
//! ```text
//! ┌────────────┐ create intent ┌────────────┐  PaymentIntent  ┌────────┐
//! │ Checkout   │──────────────▶│  Backend   │────────────────▶│ Stripe │
//! │ Orchestr.  │◀──────────────│ (server)   │◀────────────────│        │
//! │            │ clientSecret  └────────────┘  client_secret  │        │
//! │            │                                              │        │
//! │            │── tokenize card / confirm(clientSecret) ────▶│        │
//! │            │◀──────────────── status, id ─────────────────│        │
//! │            │                                              └────────┘
//! │            │── POST /order, PATCH /plants/quantity/{id} ─▶ Backend
//! └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plant_payments::{CheckoutConfig, CheckoutOrchestrator, StripeElements};
//!
//! let mut checkout = CheckoutOrchestrator::new(backend, ui, CheckoutConfig::default())
//!     .with_payments(Arc::new(StripeElements::from_env()?), elements);
//!
//! checkout.supply_purchase(purchase).await;
//! let outcome = checkout.submit().await;
//! ```

mod card;
mod checkout;
mod elements;
mod error;
mod intents;
mod provider;
mod ui;

pub use card::{CardBrand, CardDetails};
pub use checkout::{
    CheckoutConfig, CheckoutFailure, CheckoutOrchestrator, CheckoutOutcome, CheckoutState,
    SubmitRejection,
};
pub use elements::StripeElements;
pub use error::{PaymentError, Result};
pub use intents::{IntentIssuer, LocalIntentIssuer, StripeClient};
pub use provider::{
    BillingDetails, CardElement, ConfirmCardPayment, ElementRegistry, IntentStatus,
    MockPaymentProvider, PaymentIntent, PaymentMethod, PaymentProvider, ProviderCall,
    StaticElements,
};
pub use ui::{CheckoutUi, LogUi, RecordingUi, UiEvent};
