//! Payment Provider Strategy Pattern
//!
//! The checkout never talks to the provider's SDK directly. It is handed a
//! `PaymentProvider` (tokenize + confirm) and an `ElementRegistry` (where the
//! mounted card input lives), so tests can substitute doubles.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plant_payments::{StripeElements, PaymentProvider};
//!
//! let provider = StripeElements::from_env()?;
//! let method = provider.create_payment_method(&card).await?;
//! let intent = provider.confirm_card_payment(&secret, &params).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use plant_core::ClientSecret;

use crate::card::CardDetails;
use crate::error::{PaymentError, Result};

/// Tokenized card reference issued by the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub last4: Option<String>,
}

/// Payment intent status as reported by the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentStatus {
    Succeeded,
    Processing,
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    RequiresCapture,
    Canceled,
    Other(String),
}

impl IntentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Processing => "processing",
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Other(s) => s,
        }
    }
}

impl From<String> for IntentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "succeeded" => IntentStatus::Succeeded,
            "processing" => IntentStatus::Processing,
            "requires_payment_method" => IntentStatus::RequiresPaymentMethod,
            "requires_confirmation" => IntentStatus::RequiresConfirmation,
            "requires_action" => IntentStatus::RequiresAction,
            "requires_capture" => IntentStatus::RequiresCapture,
            "canceled" => IntentStatus::Canceled,
            _ => IntentStatus::Other(s),
        }
    }
}

impl From<IntentStatus> for String {
    fn from(status: IntentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment intent after confirmation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Transaction identifier recorded on the order
    pub id: String,

    pub status: IntentStatus,
}

/// Billing identity attached to the card at confirmation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
}

/// Parameters for confirming a card payment against an intent secret
#[derive(Clone)]
pub struct ConfirmCardPayment {
    /// The mounted card element
    pub card: Arc<dyn CardElement>,

    pub billing_details: BillingDetails,
}

impl std::fmt::Debug for ConfirmCardPayment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmCardPayment")
            .field("card", &self.card.card_details())
            .field("billing_details", &self.billing_details)
            .finish()
    }
}

/// Secure card input widget. Owns the raw card data.
pub trait CardElement: Send + Sync {
    /// Current contents of the input
    fn card_details(&self) -> CardDetails;
}

/// Registry of mounted input elements
pub trait ElementRegistry: Send + Sync {
    /// The mounted card element, if any
    fn card_element(&self) -> Option<Arc<dyn CardElement>>;
}

/// Strategy trait for payment providers
///
/// Implement this trait to add support for a new provider. The checkout works
/// exclusively through this interface.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Tokenize the card currently held by `card`
    ///
    /// Invalid card data is reported as `PaymentError::CardValidation`.
    async fn create_payment_method(&self, card: &dyn CardElement) -> Result<PaymentMethod>;

    /// Confirm the intent behind `secret` with the given card
    async fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
        params: &ConfirmCardPayment,
    ) -> Result<PaymentIntent>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Element registry with a fixed card slot
#[derive(Clone, Default)]
pub struct StaticElements {
    card: Option<Arc<dyn CardElement>>,
}

impl StaticElements {
    /// Registry with `card` mounted
    pub fn mounted(card: impl CardElement + 'static) -> Self {
        Self {
            card: Some(Arc::new(card)),
        }
    }

    /// Registry with nothing mounted
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ElementRegistry for StaticElements {
    fn card_element(&self) -> Option<Arc<dyn CardElement>> {
        self.card.clone()
    }
}

/// Calls seen by the mock provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderCall {
    CreatePaymentMethod { last4: String },
    ConfirmCardPayment { intent_id: String, billing_details: BillingDetails },
}

/// Mock provider
///
/// For testing. Tokenizes any card that passes local validation and confirms
/// with a configurable status.
pub struct MockPaymentProvider {
    transaction_id: String,
    status: IntentStatus,
    card_error: Option<(String, String)>,
    confirm_error: Option<String>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl MockPaymentProvider {
    /// Confirms every payment as succeeded under `transaction_id`
    pub fn succeeding(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            status: IntentStatus::Succeeded,
            card_error: None,
            confirm_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Report `status` from confirmation instead of succeeded
    pub fn with_status(mut self, status: IntentStatus) -> Self {
        self.status = status;
        self
    }

    /// Decline every card at tokenization
    pub fn with_card_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.card_error = Some((code.into(), message.into()));
        self
    }

    /// Fail confirmation with a provider error
    pub fn with_confirm_error(mut self, message: impl Into<String>) -> Self {
        self.confirm_error = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: ProviderCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_method(&self, card: &dyn CardElement) -> Result<PaymentMethod> {
        let details = card.card_details();
        self.record(ProviderCall::CreatePaymentMethod {
            last4: details.last4().to_string(),
        });

        if let Some((code, message)) = &self.card_error {
            return Err(PaymentError::card(code.clone(), message.clone()));
        }
        details.validate()?;

        Ok(PaymentMethod {
            id: format!("pm_mock_{}", details.last4()),
            brand: Some(details.brand().as_str().to_string()),
            last4: Some(details.last4().to_string()),
        })
    }

    async fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
        params: &ConfirmCardPayment,
    ) -> Result<PaymentIntent> {
        self.record(ProviderCall::ConfirmCardPayment {
            intent_id: secret.intent_id().to_string(),
            billing_details: params.billing_details.clone(),
        });

        if let Some(message) = &self.confirm_error {
            return Err(PaymentError::Stripe(message.clone()));
        }

        Ok(PaymentIntent {
            id: self.transaction_id.clone(),
            status: self.status.clone(),
        })
    }

    fn name(&self) -> &str {
        "MockProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CardDetails {
        CardDetails::new("4242424242424242", 12, 2099, "123")
    }

    #[test]
    fn test_intent_status_round_trip_unknown() {
        let status: IntentStatus = serde_json::from_str(r#""requires_action""#).unwrap();
        assert_eq!(status, IntentStatus::RequiresAction);

        let other: IntentStatus = serde_json::from_str(r#""something_new""#).unwrap();
        assert_eq!(other, IntentStatus::Other("something_new".into()));
        assert_eq!(serde_json::to_string(&other).unwrap(), r#""something_new""#);
    }

    #[test]
    fn test_static_elements() {
        assert!(StaticElements::empty().card_element().is_none());
        assert!(StaticElements::mounted(card()).card_element().is_some());
    }

    #[tokio::test]
    async fn test_mock_tokenizes_valid_card() {
        let provider = MockPaymentProvider::succeeding("txn_1");
        let method = provider.create_payment_method(&card()).await.unwrap();

        assert_eq!(method.id, "pm_mock_4242");
        assert_eq!(method.brand.as_deref(), Some("visa"));
    }

    #[tokio::test]
    async fn test_mock_rejects_invalid_card() {
        let provider = MockPaymentProvider::succeeding("txn_1");
        let bad = CardDetails::new("1234567890123", 12, 2099, "123");

        let result = provider.create_payment_method(&bad).await;
        assert!(matches!(result, Err(PaymentError::CardValidation { .. })));
    }
}
