//! Application State

use std::sync::Arc;

use plant_core::ComposedChart;
use plant_payments::IntentIssuer;

use crate::store::ShopStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Plants and orders
    pub store: Arc<ShopStore>,

    /// Payment intent issuer (optional - None if Stripe is not configured)
    pub intents: Option<Arc<dyn IntentIssuer>>,

    /// Dashboard chart layout
    pub chart: Arc<ComposedChart>,
}

impl AppState {
    pub fn new(store: ShopStore, intents: Option<Arc<dyn IntentIssuer>>) -> Self {
        Self {
            store: Arc::new(store),
            intents,
            chart: Arc::new(ComposedChart::default()),
        }
    }
}
