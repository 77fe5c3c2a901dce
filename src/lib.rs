//! Storefront cart and checkout engine
//!
//! One codebase serves many tenant businesses, each rendered through a
//! per-business template. This crate owns the slice with actual state:
//!
//! ## Features
//! - Session-scoped shopping cart with persisted state and hydration
//! - Discount code validation against a backend authority
//! - Checkout session initiation (hosted payment page handoff)
//! - Closed-set template resolution with a default fallback

use thiserror::Error;

pub mod api;
pub mod backend;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod store;
pub mod template;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Line item not found")]
    LineNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("A discount validation is already in progress")]
    ValidationInProgress,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
