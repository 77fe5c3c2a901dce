//! Checkout session initiation
//!
//! Local precondition checks plus assembly of the session-creation request.
//! Everything past the returned payment URL (webhooks, order creation) is
//! owned by the backend; this is a one-way handoff.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::backend::{CreateSessionRequest, SessionCustomer, SessionLineItem};
use crate::domain::aggregates::{AppliedDiscount, CartLine};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter your name"))]
    pub name: String,
}

/// Check the local preconditions and build the backend request. No network
/// call happens here; a failure leaves cart and contact data untouched so
/// the shopper can correct and resubmit.
pub fn build_checkout_request(
    business_id: &str,
    items: &[CartLine],
    customer: &CustomerInfo,
    discount: Option<&AppliedDiscount>,
) -> Result<CreateSessionRequest> {
    if items.is_empty() {
        return Err(StorefrontError::Validation("Your cart is empty".into()));
    }
    let trimmed = CustomerInfo {
        email: customer.email.trim().to_string(),
        name: customer.name.trim().to_string(),
    };
    if let Err(errors) = trimmed.validate() {
        return Err(StorefrontError::Validation(first_message(&errors)));
    }

    Ok(CreateSessionRequest {
        business_id: business_id.to_string(),
        items: items
            .iter()
            .map(|line| SessionLineItem {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                name: display_name(line),
                price: line.price,
                quantity: line.quantity,
                sku: line.sku.clone(),
            })
            .collect(),
        customer_info: SessionCustomer { email: trimmed.email, name: trimmed.name },
        discount_code_id: discount.map(|d| d.id.clone()),
        discount_amount: discount.map(|d| d.discount_amount),
    })
}

fn display_name(line: &CartLine) -> String {
    match &line.variant_name {
        Some(variant) => format!("{} - {}", line.product_name, variant),
        None => line.product_name.clone(),
    }
}

fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Please check your details".to_string())
}
