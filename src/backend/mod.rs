//! Remote collaborators
//!
//! The storefront never decides discounts or inventory itself. Two backend
//! services hold authority: discount validation (expiry, minimum spend,
//! usage caps) and checkout-session creation (final inventory check plus
//! the payment-processor handoff). This module is the trait seam; the
//! `http` submodule is the production wiring.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::AppliedDiscount;
use crate::Result;

pub mod http;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidateDiscountRequest {
    pub code: String,
    pub business_id: String,
    /// Subtotal at validation time, minor units.
    pub cart_total: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidateDiscountResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<AppliedDiscount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionLineItem {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionCustomer {
    pub email: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub business_id: String,
    pub items: Vec<SessionLineItem>,
    pub customer_info: SessionCustomer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<i64>,
}

/// Success carries the hosted payment page URL; failure carries a message
/// and, when inventory moved underneath the cart, the offending product
/// identifiers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateSessionResponse {
    Ready {
        session_url: String,
    },
    Rejected {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        unavailable_items: Option<Vec<String>>,
    },
}

#[async_trait]
pub trait DiscountBackend: Send + Sync {
    async fn validate(&self, request: ValidateDiscountRequest) -> Result<ValidateDiscountResponse>;
}

#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionResponse>;
}
