//! Payment Intent Issuing
//!
//! Server-side half of the Stripe integration. The backend opens a payment
//! intent for the computed amount and hands its client secret to the
//! storefront, which confirms it with the card.

use async_trait::async_trait;
use std::collections::HashMap;
use stripe::{Client, CreatePaymentIntent, Currency, PaymentIntent};

use plant_core::{ClientSecret, PlantId};

use crate::error::{PaymentError, Result};

/// Opens payment intents (secret-key side)
#[async_trait]
pub trait IntentIssuer: Send + Sync {
    /// Open an intent for `amount_cents` and return its client secret
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        plant_id: &PlantId,
        quantity: u32,
    ) -> Result<ClientSecret>;
}

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;

        Ok(Self::new(&secret_key))
    }

    /// Get the underlying Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl IntentIssuer for StripeClient {
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        plant_id: &PlantId,
        quantity: u32,
    ) -> Result<ClientSecret> {
        if amount_cents <= 0 {
            return Err(PaymentError::Stripe(format!("Invalid amount: {amount_cents}")));
        }

        let mut params = CreatePaymentIntent::new(amount_cents, Currency::USD);
        params.payment_method_types = Some(vec!["card".to_string()]);

        // Add metadata for tracking
        let mut metadata = HashMap::new();
        metadata.insert("plant_id".to_string(), plant_id.to_string());
        metadata.insert("quantity".to_string(), quantity.to_string());
        params.metadata = Some(metadata);

        let intent = PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        tracing::info!(
            intent_id = %intent.id,
            amount_cents,
            plant_id = %plant_id,
            "Created payment intent"
        );

        intent
            .client_secret
            .map(ClientSecret::new)
            .ok_or_else(|| PaymentError::Stripe("No client secret returned".into()))
    }
}

/// Issuer that never talks to Stripe
///
/// For development and tests. Secrets look like real ones
/// (`pi_local_<n>_secret_<amount>`) and every issued intent is remembered.
#[derive(Default)]
pub struct LocalIntentIssuer {
    issued: std::sync::Mutex<Vec<(PlantId, i64)>>,
}

impl LocalIntentIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intents issued so far as `(plant, amount_cents)`
    pub fn issued(&self) -> Vec<(PlantId, i64)> {
        self.issued
            .lock()
            .map(|issued| issued.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IntentIssuer for LocalIntentIssuer {
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        plant_id: &PlantId,
        _quantity: u32,
    ) -> Result<ClientSecret> {
        let mut issued = self
            .issued
            .lock()
            .map_err(|_| PaymentError::Stripe("intent log poisoned".into()))?;
        issued.push((plant_id.clone(), amount_cents));

        Ok(ClientSecret::new(format!(
            "pi_local_{}_secret_{amount_cents}",
            issued.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_issuer_records_amounts() {
        let issuer = LocalIntentIssuer::new();
        let secret = issuer
            .create_payment_intent(8000, &PlantId::new("p1"), 2)
            .await
            .unwrap();

        assert_eq!(secret.intent_id(), "pi_local_1");
        assert_eq!(issuer.issued(), vec![(PlantId::new("p1"), 8000)]);
    }
}
