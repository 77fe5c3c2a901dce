//! HTTP implementations of the backend traits

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{
    CheckoutBackend, CreateSessionRequest, CreateSessionResponse, DiscountBackend,
    ValidateDiscountRequest, ValidateDiscountResponse,
};
use crate::{Result, StorefrontError};

/// JSON client for both backend procedures, sharing one connection pool.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorefrontError::Backend(e.to_string()))?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DiscountBackend for HttpBackend {
    async fn validate(&self, request: ValidateDiscountRequest) -> Result<ValidateDiscountResponse> {
        let response = self
            .client
            .post(self.url("/api/discounts/validate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| StorefrontError::Backend(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StorefrontError::Backend(format!(
                "discount validation returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| StorefrontError::Backend(e.to_string()))
    }
}

#[async_trait]
impl CheckoutBackend for HttpBackend {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionResponse> {
        let response = self
            .client
            .post(self.url("/api/stripe/create-session"))
            .json(&request)
            .send()
            .await
            .map_err(|e| StorefrontError::Backend(e.to_string()))?;
        // Rejections (invalid cart, inventory drift) come back as structured
        // JSON on non-2xx statuses; only undecodable bodies are transport
        // failures.
        response
            .json()
            .await
            .map_err(|e| StorefrontError::Backend(e.to_string()))
    }
}
