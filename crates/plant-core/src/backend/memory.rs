//! In-Memory Backend
//!
//! Records every call in arrival order and can be told to fail any of them.
//! Used to check the checkout's call sequencing without a server.

use async_trait::async_trait;
use std::sync::Mutex;

use super::ShopBackend;
use crate::error::{Result, ShopError};
use crate::model::{ClientSecret, InventoryUpdate, OrderRecord, PaymentIntentRequest, PlantId};

/// One recorded backend call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    CreatePaymentIntent(PaymentIntentRequest),
    CreateOrder(OrderRecord),
    AdjustInventory { plant_id: PlantId, update: InventoryUpdate },
}

#[derive(Default)]
struct Failures {
    intent: bool,
    order: bool,
    inventory: bool,
}

/// Backend double with a call log
pub struct MemoryBackend {
    secret: String,
    calls: Mutex<Vec<BackendCall>>,
    failures: Mutex<Failures>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new("pi_test_secret_test")
    }
}

impl MemoryBackend {
    /// Backend that answers every intent request with `secret`
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Failures::default()),
        }
    }

    pub fn fail_intent(&self, fail: bool) {
        self.lock_failures().intent = fail;
    }

    pub fn fail_order(&self, fail: bool) {
        self.lock_failures().order = fail;
    }

    pub fn fail_inventory(&self, fail: bool) {
        self.lock_failures().inventory = fail;
    }

    /// Snapshot of every call made so far
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn intent_requests(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::CreatePaymentIntent(_)))
            .count()
    }

    fn record(&self, call: BackendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, Failures> {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn injected(what: &str) -> ShopError {
        ShopError::Backend {
            status: 500,
            message: format!("injected {what} failure"),
        }
    }
}

#[async_trait]
impl ShopBackend for MemoryBackend {
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<ClientSecret> {
        self.record(BackendCall::CreatePaymentIntent(request.clone()));

        if self.lock_failures().intent {
            return Err(Self::injected("payment intent"));
        }
        Ok(ClientSecret::new(self.secret.clone()))
    }

    async fn create_order(&self, order: &OrderRecord) -> Result<()> {
        self.record(BackendCall::CreateOrder(order.clone()));

        if self.lock_failures().order {
            return Err(Self::injected("order"));
        }
        Ok(())
    }

    async fn adjust_inventory(&self, plant_id: &PlantId, update: &InventoryUpdate) -> Result<()> {
        self.record(BackendCall::AdjustInventory {
            plant_id: plant_id.clone(),
            update: update.clone(),
        });

        if self.lock_failures().inventory {
            return Err(Self::injected("inventory"));
        }
        Ok(())
    }
}
