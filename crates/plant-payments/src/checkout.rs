//! Checkout Orchestration
//!
//! Drives one purchase from payment intent to recorded order:
//!
//! ```text
//! Idle ─▶ IntentPending ─▶ IntentReady ─▶ Submitting ─▶ Tokenizing ─▶ Confirming
//!              │                                           │             │
//!              ▼                                           ▼             ├─▶ Stalled(status)
//!     Failed(IntentUnavailable)                 Failed(CardRejected)     ▼
//!                                                                   Recording ─▶ Succeeded
//!                                                                        │
//!                                                                        ▼
//!                                                              Failed(Recording)
//! ```
//!
//! Every step runs once, in order, and none is retried. Failures are caught
//! at the step that produced them, logged, and kept in [`CheckoutState`];
//! nothing is surfaced to the user except the success toast.
//!
//! `Failed(IntentUnavailable)` is not terminal. No secret is held, so the
//! checkout behaves as `Idle` and the next [`CheckoutOrchestrator::supply_purchase`]
//! leaves it with a fresh intent request.

use std::sync::Arc;

use plant_core::{ClientSecret, InventoryUpdate, OrderRecord, PurchaseInfo, ShopBackend};

use crate::error::PaymentError;
use crate::provider::{
    BillingDetails, CardElement, ConfirmCardPayment, ElementRegistry, IntentStatus, PaymentProvider,
};
use crate::ui::CheckoutUi;

/// Checkout settings
#[derive(Clone, Debug)]
pub struct CheckoutConfig {
    /// Route shown after a recorded order
    pub success_route: String,

    /// Toast shown after a recorded order
    pub success_message: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            success_route: "/dashboard/my-orders".into(),
            success_message: "Order Success".into(),
        }
    }
}

/// Why a checkout attempt ended without an order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutFailure {
    /// The backend would not open a payment intent. Submission stays disabled.
    IntentUnavailable { message: String },

    /// The provider refused the card at tokenization
    CardRejected { code: String, message: String },

    /// The provider errored while confirming the intent
    Confirmation { message: String },

    /// The card was charged but the order or inventory call failed.
    ///
    /// `transaction_id` is the charge to reconcile; `order_recorded` says
    /// whether the order POST went through before the failure.
    Recording {
        transaction_id: String,
        order_recorded: bool,
        message: String,
    },
}

/// Explicit checkout state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    IntentPending,
    IntentReady,
    Submitting,
    Tokenizing,
    Confirming { payment_method_id: String },
    Recording { transaction_id: String },
    Succeeded { transaction_id: String },

    /// Confirmation came back with a status other than succeeded. No order is
    /// recorded and the processing flag stays set until the checkout is closed.
    Stalled { status: IntentStatus },

    Failed(CheckoutFailure),
}

/// Why a submit was refused before anything was sent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitRejection {
    /// A previous submit is still being processed
    AlreadyProcessing,

    /// No payment provider or element registry attached yet
    ProviderNotReady,

    /// No card element mounted
    CardNotMounted,

    /// No payment intent secret for the current purchase
    NoClientSecret,
}

/// Result of one submit
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Succeeded { transaction_id: String },
    Rejected(SubmitRejection),
    Stalled { status: IntentStatus },
    Failed(CheckoutFailure),
}

/// Stateful checkout for one purchase surface
pub struct CheckoutOrchestrator {
    backend: Arc<dyn ShopBackend>,
    ui: Arc<dyn CheckoutUi>,
    provider: Option<Arc<dyn PaymentProvider>>,
    elements: Option<Arc<dyn ElementRegistry>>,
    config: CheckoutConfig,
    purchase: Option<PurchaseInfo>,
    client_secret: Option<ClientSecret>,
    processing: bool,
    state: CheckoutState,
}

impl CheckoutOrchestrator {
    pub fn new(
        backend: Arc<dyn ShopBackend>,
        ui: Arc<dyn CheckoutUi>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            backend,
            ui,
            provider: None,
            elements: None,
            config,
            purchase: None,
            client_secret: None,
            processing: false,
            state: CheckoutState::Idle,
        }
    }

    /// Attach the payment provider and its element registry once loaded
    pub fn attach_payments(
        &mut self,
        provider: Arc<dyn PaymentProvider>,
        elements: Arc<dyn ElementRegistry>,
    ) {
        tracing::debug!(provider = provider.name(), "Payment provider attached");
        self.provider = Some(provider);
        self.elements = Some(elements);
    }

    pub fn with_payments(
        mut self,
        provider: Arc<dyn PaymentProvider>,
        elements: Arc<dyn ElementRegistry>,
    ) -> Self {
        self.attach_payments(provider, elements);
        self
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn client_secret(&self) -> Option<&ClientSecret> {
        self.client_secret.as_ref()
    }

    pub fn purchase(&self) -> Option<&PurchaseInfo> {
        self.purchase.as_ref()
    }

    /// Whether the pay button is enabled
    pub fn can_submit(&self) -> bool {
        self.provider.is_some() && self.client_secret.is_some() && !self.processing
    }

    /// Pay button label
    pub fn pay_label(&self) -> String {
        self.purchase
            .as_ref()
            .map_or_else(|| "Pay".into(), |p| format!("Pay {}$", p.price))
    }

    /// Supply (or re-supply) the purchase and fetch a payment intent for it.
    ///
    /// A different purchase discards the held secret and triggers exactly one
    /// intent request. Re-supplying the same purchase is a no-op only in
    /// `IntentReady`; from any other state the intent is fetched again.
    /// Returns whether a secret is held afterwards.
    pub async fn supply_purchase(&mut self, purchase: PurchaseInfo) -> bool {
        if self.state == CheckoutState::IntentReady
            && self.client_secret.is_some()
            && self.purchase.as_ref() == Some(&purchase)
        {
            return true;
        }

        self.client_secret = None;
        self.state = CheckoutState::IntentPending;
        let request = purchase.intent_request();
        self.purchase = Some(purchase);

        match self.backend.create_payment_intent(&request).await {
            Ok(secret) => {
                tracing::debug!(
                    plant_id = %request.plant_id,
                    intent_id = secret.intent_id(),
                    "Payment intent ready"
                );
                self.client_secret = Some(secret);
                self.state = CheckoutState::IntentReady;
                true
            }
            Err(e) => {
                tracing::warn!(
                    plant_id = %request.plant_id,
                    error = %e,
                    "Failed to create payment intent"
                );
                self.state = CheckoutState::Failed(CheckoutFailure::IntentUnavailable {
                    message: e.to_string(),
                });
                false
            }
        }
    }

    /// Run the payment for the current purchase
    pub async fn submit(&mut self) -> CheckoutOutcome {
        if self.processing {
            return CheckoutOutcome::Rejected(SubmitRejection::AlreadyProcessing);
        }

        let previous = std::mem::replace(&mut self.state, CheckoutState::Submitting);
        self.processing = true;

        let ready = self.preflight();
        let (provider, card, secret, purchase) = match ready {
            Ok(parts) => parts,
            Err(rejection) => {
                tracing::debug!(?rejection, "Checkout submit rejected");
                self.processing = false;
                self.state = previous;
                return CheckoutOutcome::Rejected(rejection);
            }
        };

        // Tokenize
        self.state = CheckoutState::Tokenizing;
        let method = match provider.create_payment_method(card.as_ref()).await {
            Ok(method) => method,
            Err(e) => {
                tracing::warn!(error = %e, "Card tokenization failed");
                let (code, message) = match e {
                    PaymentError::CardValidation { code, message } => (code, message),
                    other => ("provider_error".to_string(), other.to_string()),
                };
                return self.fail(CheckoutFailure::CardRejected { code, message });
            }
        };
        tracing::debug!(payment_method = %method.id, "Card tokenized");

        // Confirm
        self.state = CheckoutState::Confirming {
            payment_method_id: method.id,
        };
        let params = ConfirmCardPayment {
            card,
            billing_details: BillingDetails {
                name: purchase.customer.name.clone(),
                email: purchase.customer.email.clone(),
            },
        };
        let intent = match provider.confirm_card_payment(&secret, &params).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "Card payment confirmation failed");
                return self.fail(CheckoutFailure::Confirmation {
                    message: e.to_string(),
                });
            }
        };

        if intent.status != IntentStatus::Succeeded {
            tracing::warn!(
                intent_id = %intent.id,
                status = %intent.status,
                "Payment not succeeded; checkout stalled"
            );
            self.state = CheckoutState::Stalled {
                status: intent.status.clone(),
            };
            return CheckoutOutcome::Stalled {
                status: intent.status,
            };
        }

        // Record
        let transaction_id = intent.id;
        self.state = CheckoutState::Recording {
            transaction_id: transaction_id.clone(),
        };
        // The intent is spent whatever happens next.
        self.client_secret = None;

        let outcome = match self.record(&purchase, &transaction_id).await {
            Ok(()) => {
                tracing::info!(
                    transaction_id = %transaction_id,
                    plant_id = %purchase.plant_id,
                    quantity = purchase.quantity,
                    "Order recorded"
                );
                self.ui.notify_success(&self.config.success_message);
                self.ui.refresh();
                self.ui.navigate(&self.config.success_route);
                self.state = CheckoutState::Succeeded {
                    transaction_id: transaction_id.clone(),
                };
                CheckoutOutcome::Succeeded { transaction_id }
            }
            Err(failure) => {
                tracing::error!(?failure, "Charged payment could not be recorded");
                self.state = CheckoutState::Failed(failure.clone());
                CheckoutOutcome::Failed(failure)
            }
        };

        // Cleanup runs on both paths.
        self.processing = false;
        self.ui.close();
        outcome
    }

    /// Close the checkout surface. In-flight work is not aborted; with
    /// `&mut self` there is none left by the time this runs.
    ///
    /// A stalled intent is abandoned: its secret is dropped and the checkout
    /// returns to `Idle`.
    pub fn cancel(&mut self) {
        self.processing = false;
        if matches!(self.state, CheckoutState::Stalled { .. }) {
            self.client_secret = None;
            self.state = CheckoutState::Idle;
        }
        self.ui.close();
    }

    #[allow(clippy::type_complexity)]
    fn preflight(
        &self,
    ) -> Result<
        (
            Arc<dyn PaymentProvider>,
            Arc<dyn CardElement>,
            ClientSecret,
            PurchaseInfo,
        ),
        SubmitRejection,
    > {
        let (Some(provider), Some(elements)) = (&self.provider, &self.elements) else {
            return Err(SubmitRejection::ProviderNotReady);
        };
        let card = elements
            .card_element()
            .ok_or(SubmitRejection::CardNotMounted)?;
        let (Some(secret), Some(purchase)) = (&self.client_secret, &self.purchase) else {
            return Err(SubmitRejection::NoClientSecret);
        };

        Ok((provider.clone(), card, secret.clone(), purchase.clone()))
    }

    /// Order POST, then inventory PATCH. Never the PATCH without the POST.
    async fn record(
        &self,
        purchase: &PurchaseInfo,
        transaction_id: &str,
    ) -> Result<(), CheckoutFailure> {
        let failure = |order_recorded: bool, e: plant_core::ShopError| CheckoutFailure::Recording {
            transaction_id: transaction_id.to_string(),
            order_recorded,
            message: e.to_string(),
        };

        let order = OrderRecord::new(purchase.clone(), transaction_id);
        self.backend
            .create_order(&order)
            .await
            .map_err(|e| failure(false, e))?;

        self.backend
            .adjust_inventory(&purchase.plant_id, &InventoryUpdate::decrease(purchase.quantity))
            .await
            .map_err(|e| failure(true, e))
    }

    fn fail(&mut self, failure: CheckoutFailure) -> CheckoutOutcome {
        self.processing = false;
        self.state = CheckoutState::Failed(failure.clone());
        CheckoutOutcome::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_core::{Customer, MemoryBackend};
    use rust_decimal_macros::dec;

    use crate::card::CardDetails;
    use crate::provider::{MockPaymentProvider, StaticElements};
    use crate::ui::RecordingUi;

    fn purchase() -> PurchaseInfo {
        PurchaseInfo::new("p1", 2, dec!(40), Customer::new("A", "a@x.com"))
    }

    fn test_card() -> CardDetails {
        CardDetails::new("4242424242424242", 12, 2099, "123")
    }

    fn orchestrator(backend: Arc<MemoryBackend>) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(backend, Arc::new(RecordingUi::new()), CheckoutConfig::default())
    }

    #[test]
    fn test_config_defaults() {
        let config = CheckoutConfig::default();
        assert_eq!(config.success_route, "/dashboard/my-orders");
        assert_eq!(config.success_message, "Order Success");
    }

    #[tokio::test]
    async fn test_intent_fetch_moves_to_ready() {
        let backend = Arc::new(MemoryBackend::new("cs_1"));
        let mut checkout = orchestrator(backend.clone());

        assert_eq!(checkout.state(), &CheckoutState::Idle);
        assert!(checkout.supply_purchase(purchase()).await);
        assert_eq!(checkout.state(), &CheckoutState::IntentReady);
        assert_eq!(checkout.client_secret().unwrap().expose(), "cs_1");
        assert_eq!(checkout.pay_label(), "Pay 40$");
    }

    #[tokio::test]
    async fn test_same_purchase_is_not_refetched() {
        let backend = Arc::new(MemoryBackend::new("cs_1"));
        let mut checkout = orchestrator(backend.clone());

        checkout.supply_purchase(purchase()).await;
        checkout.supply_purchase(purchase()).await;
        assert_eq!(backend.intent_requests(), 1);
    }

    #[tokio::test]
    async fn test_intent_failure_is_silent_and_blocks_submit() {
        let backend = Arc::new(MemoryBackend::default());
        backend.fail_intent(true);
        let mut checkout = orchestrator(backend.clone()).with_payments(
            Arc::new(MockPaymentProvider::succeeding("txn")),
            Arc::new(StaticElements::mounted(test_card())),
        );

        assert!(!checkout.supply_purchase(purchase()).await);
        assert!(matches!(
            checkout.state(),
            CheckoutState::Failed(CheckoutFailure::IntentUnavailable { .. })
        ));
        assert!(!checkout.can_submit());
        assert_eq!(
            checkout.submit().await,
            CheckoutOutcome::Rejected(SubmitRejection::NoClientSecret)
        );
        assert!(!checkout.is_processing());
    }

    #[tokio::test]
    async fn test_submit_without_provider_clears_processing() {
        let backend = Arc::new(MemoryBackend::new("cs_1"));
        let mut checkout = orchestrator(backend);
        checkout.supply_purchase(purchase()).await;

        assert!(!checkout.can_submit());
        assert_eq!(
            checkout.submit().await,
            CheckoutOutcome::Rejected(SubmitRejection::ProviderNotReady)
        );
        assert!(!checkout.is_processing());
        assert_eq!(checkout.state(), &CheckoutState::IntentReady);
    }

    #[tokio::test]
    async fn test_unmounted_card_rejected() {
        let backend = Arc::new(MemoryBackend::new("cs_1"));
        let mut checkout = orchestrator(backend).with_payments(
            Arc::new(MockPaymentProvider::succeeding("txn")),
            Arc::new(StaticElements::empty()),
        );
        checkout.supply_purchase(purchase()).await;

        assert_eq!(
            checkout.submit().await,
            CheckoutOutcome::Rejected(SubmitRejection::CardNotMounted)
        );
        assert!(!checkout.is_processing());
    }

    #[tokio::test]
    async fn test_stalled_keeps_processing_until_cancel() {
        let backend = Arc::new(MemoryBackend::new("cs_1"));
        let mut checkout = orchestrator(backend.clone()).with_payments(
            Arc::new(MockPaymentProvider::succeeding("txn").with_status(IntentStatus::Processing)),
            Arc::new(StaticElements::mounted(test_card())),
        );
        checkout.supply_purchase(purchase()).await;

        let outcome = checkout.submit().await;
        assert_eq!(outcome, CheckoutOutcome::Stalled { status: IntentStatus::Processing });
        assert!(checkout.is_processing());
        assert_eq!(
            checkout.submit().await,
            CheckoutOutcome::Rejected(SubmitRejection::AlreadyProcessing)
        );

        checkout.cancel();
        assert!(!checkout.is_processing());
        assert_eq!(checkout.state(), &CheckoutState::Idle);
        assert!(checkout.client_secret().is_none());
    }

    #[tokio::test]
    async fn test_same_purchase_after_stall_fetches_new_intent() {
        let backend = Arc::new(MemoryBackend::new("cs_1"));
        let mut checkout = orchestrator(backend.clone()).with_payments(
            Arc::new(MockPaymentProvider::succeeding("txn").with_status(IntentStatus::Processing)),
            Arc::new(StaticElements::mounted(test_card())),
        );
        checkout.supply_purchase(purchase()).await;
        checkout.submit().await;
        checkout.cancel();

        assert!(checkout.supply_purchase(purchase()).await);
        assert_eq!(backend.intent_requests(), 2);
        assert_eq!(checkout.state(), &CheckoutState::IntentReady);
        assert!(checkout.can_submit());
    }

    #[tokio::test]
    async fn test_supply_after_intent_failure_recovers() {
        let backend = Arc::new(MemoryBackend::new("cs_1"));
        backend.fail_intent(true);
        let mut checkout = orchestrator(backend.clone());

        assert!(!checkout.supply_purchase(purchase()).await);
        backend.fail_intent(false);

        assert!(checkout.supply_purchase(purchase()).await);
        assert_eq!(backend.intent_requests(), 2);
        assert_eq!(checkout.state(), &CheckoutState::IntentReady);
    }
}
