//! HTTP Backend Client
//!
//! `ShopBackend` over the plant-server REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use super::ShopBackend;
use crate::error::{Result, ShopError};
use crate::model::{
    ClientSecret, InventoryUpdate, OrderRecord, PaymentIntentRequest, PaymentIntentResponse,
    PlantId,
};

/// Backend connection settings
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Base URL of the shop API
    pub base_url: String,

    /// Bearer token sent with every request
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("PLANT_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into());
        let token = std::env::var("PLANT_API_TOKEN").ok().filter(|t| !t.is_empty());

        Self {
            base_url,
            token,
            ..Default::default()
        }
    }
}

/// REST client for the shop backend
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn from_config(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(BackendConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-success response into a `ShopError::Backend`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["error"].as_str().unwrap_or("Request failed").to_string();

        Err(ShopError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ShopBackend for HttpBackend {
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<ClientSecret> {
        let response = self
            .authorize(self.client.post(self.url("/create-payment-intent")))
            .json(request)
            .send()
            .await?;

        let data: PaymentIntentResponse = Self::check(response).await?.json().await?;
        Ok(data.client_secret)
    }

    async fn create_order(&self, order: &OrderRecord) -> Result<()> {
        let response = self
            .authorize(self.client.post(self.url("/order")))
            .json(order)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn adjust_inventory(&self, plant_id: &PlantId, update: &InventoryUpdate) -> Result<()> {
        let path = format!("/plants/quantity/{plant_id}");
        let response = self
            .authorize(self.client.patch(self.url(&path)))
            .json(update)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_url_joins_trailing_slash() {
        let backend = HttpBackend::from_config(BackendConfig {
            base_url: "http://shop.local/".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(backend.url("/order"), "http://shop.local/order");
    }
}
