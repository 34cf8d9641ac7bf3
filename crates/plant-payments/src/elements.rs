//! Stripe Elements Client
//!
//! Client-side half of the Stripe integration: tokenizes cards and confirms
//! payment intents with the publishable key and the intent's client secret,
//! the same calls Stripe.js makes from the browser.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use plant_core::ClientSecret;

use crate::card::CardDetails;
use crate::error::{PaymentError, Result};
use crate::provider::{
    CardElement, ConfirmCardPayment, PaymentIntent, PaymentMethod, PaymentProvider,
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Publishable-key Stripe client
pub struct StripeElements {
    client: Client,
    publishable_key: String,
    api_base: String,
}

impl StripeElements {
    pub fn new(publishable_key: &str) -> Self {
        Self {
            client: Client::new(),
            publishable_key: publishable_key.to_string(),
            api_base: STRIPE_API_BASE.into(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let key = std::env::var("STRIPE_PUBLISHABLE_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_PUBLISHABLE_KEY not set".into()))?;

        if !key.starts_with("pk_") {
            return Err(PaymentError::Config(
                "STRIPE_PUBLISHABLE_KEY must be a publishable (pk_) key".into(),
            ));
        }
        Ok(Self::new(&key))
    }

    /// Point at a different API host (stripe-mock, proxies)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.publishable_key)
            .form(form)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PaymentError::RateLimited);
        }

        let body: StripeErrorBody = response
            .json()
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;
        Err(body.error.into())
    }
}

/// Form key for `segments`, optionally nested under `scope`
/// (`card[number]` or `payment_method_data[card][number]`)
fn form_key(scope: Option<&str>, segments: &[&str]) -> String {
    let mut parts = scope.into_iter().chain(segments.iter().copied());
    let head = parts.next().unwrap_or_default().to_string();
    parts.fold(head, |key, part| format!("{key}[{part}]"))
}

/// Form fields describing a card and its postal code
fn card_form(details: &CardDetails, scope: Option<&str>) -> Vec<(String, String)> {
    let mut form = vec![
        (form_key(scope, &["card", "number"]), details.number().to_string()),
        (form_key(scope, &["card", "exp_month"]), details.exp_month.to_string()),
        (form_key(scope, &["card", "exp_year"]), details.exp_year.to_string()),
        (form_key(scope, &["card", "cvc"]), details.cvc().to_string()),
    ];
    if let Some(postal) = &details.postal_code {
        form.push((
            form_key(scope, &["billing_details", "address", "postal_code"]),
            postal.clone(),
        ));
    }
    form
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeApiError,
}

#[derive(Deserialize)]
struct StripeApiError {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    code: Option<String>,

    #[serde(default)]
    message: Option<String>,
}

impl From<StripeApiError> for PaymentError {
    fn from(err: StripeApiError) -> Self {
        let message = err.message.unwrap_or_else(|| err.kind.clone());
        match err.kind.as_str() {
            "card_error" | "validation_error" => PaymentError::CardValidation {
                code: err.code.unwrap_or_else(|| err.kind.clone()),
                message,
            },
            _ => PaymentError::Stripe(message),
        }
    }
}

#[derive(Deserialize)]
struct PaymentMethodResponse {
    id: String,

    #[serde(default)]
    card: Option<CardSummary>,
}

#[derive(Deserialize)]
struct CardSummary {
    brand: Option<String>,
    last4: Option<String>,
}

#[async_trait]
impl PaymentProvider for StripeElements {
    async fn create_payment_method(&self, card: &dyn CardElement) -> Result<PaymentMethod> {
        let details = card.card_details();
        details.validate()?;

        let mut form = vec![("type".to_string(), "card".to_string())];
        form.extend(card_form(&details, None));

        let response: PaymentMethodResponse = self.post_form("/payment_methods", &form).await?;
        let (brand, last4) = response
            .card
            .map_or((None, None), |c| (c.brand, c.last4));

        Ok(PaymentMethod {
            id: response.id,
            brand,
            last4,
        })
    }

    async fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
        params: &ConfirmCardPayment,
    ) -> Result<PaymentIntent> {
        let details = params.card.card_details();
        let billing = &params.billing_details;

        let mut form = vec![
            ("client_secret".to_string(), secret.expose().to_string()),
            ("payment_method_data[type]".to_string(), "card".to_string()),
            ("payment_method_data[billing_details][name]".to_string(), billing.name.clone()),
            ("payment_method_data[billing_details][email]".to_string(), billing.email.clone()),
        ];
        form.extend(card_form(&details, Some("payment_method_data")));

        let path = format!("/payment_intents/{}/confirm", secret.intent_id());
        self.post_form(&path, &form).await
    }

    fn name(&self) -> &str {
        "Stripe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_form_fields() {
        let card = CardDetails::new("4242 4242 4242 4242", 4, 2031, "321");
        let form = card_form(&card, None);

        assert!(form.contains(&("card[number]".into(), "4242424242424242".into())));
        assert!(form.contains(&("card[exp_month]".into(), "4".into())));
        assert!(form.contains(&("card[cvc]".into(), "321".into())));
    }

    #[test]
    fn test_scoped_form_keys() {
        let card = CardDetails::new("4242424242424242", 4, 2031, "321").with_postal_code("10001");
        let form = card_form(&card, Some("payment_method_data"));

        assert_eq!(form[0].0, "payment_method_data[card][number]");
        assert_eq!(
            form.last().unwrap().0,
            "payment_method_data[billing_details][address][postal_code]"
        );
    }

    #[test]
    fn test_card_error_maps_to_validation() {
        let body: StripeErrorBody = serde_json::from_value(serde_json::json!({
            "error": {
                "type": "card_error",
                "code": "card_declined",
                "message": "Your card was declined."
            }
        }))
        .unwrap();

        match PaymentError::from(body.error) {
            PaymentError::CardValidation { code, .. } => assert_eq!(code, "card_declined"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_api_error_maps_to_stripe() {
        let body: StripeErrorBody =
            serde_json::from_str(r#"{"error":{"type":"api_error","message":"boom"}}"#).unwrap();
        assert!(matches!(PaymentError::from(body.error), PaymentError::Stripe(m) if m == "boom"));
    }

    #[tokio::test]
    async fn test_invalid_card_rejected_locally() {
        // Unroutable base: a network call would fail with Network, not CardValidation.
        let elements = StripeElements::new("pk_test_123").with_api_base("http://127.0.0.1:9");
        let card = CardDetails::new("4000 0000 0000 0001", 12, 2099, "123");

        let result = elements.create_payment_method(&card).await;
        assert!(matches!(result, Err(PaymentError::CardValidation { .. })));
    }
}
