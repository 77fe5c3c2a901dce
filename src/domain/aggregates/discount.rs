//! Discount Aggregate
//!
//! The backend is the sole authority on whether a code applies (expiry,
//! minimum spend, usage caps). This side only tracks the verdict and the
//! small state machine around an in-flight validation.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::DiscountCode;
use crate::{Result, StorefrontError};

/// A discount the backend has accepted for the current session. Ephemeral:
/// cleared on removal or when the cart is emptied, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub id: String,
    pub code: String,
    /// Amount off the subtotal, in minor units.
    pub discount_amount: i64,
}

/// `Idle -> Validating -> (Applied | Failed)`; removal returns to `Idle`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DiscountState {
    #[default]
    Idle,
    Validating {
        code: DiscountCode,
    },
    Applied(AppliedDiscount),
    Failed {
        message: String,
    },
}

impl DiscountState {
    pub fn applied(&self) -> Option<&AppliedDiscount> {
        match self {
            Self::Applied(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_validating(&self) -> bool {
        matches!(self, Self::Validating { .. })
    }

    /// Enter `Validating`. Re-applying over an already applied or failed
    /// discount clears it first; a second validation while one is in flight
    /// is rejected (there is no cancellation, the pending call must settle).
    pub fn begin_validation(&mut self, code: DiscountCode) -> Result<()> {
        if self.is_validating() {
            return Err(StorefrontError::ValidationInProgress);
        }
        *self = Self::Validating { code };
        Ok(())
    }

    /// Settle the in-flight validation with the backend's verdict.
    pub fn settle(&mut self, outcome: std::result::Result<AppliedDiscount, String>) {
        debug_assert!(self.is_validating());
        *self = match outcome {
            Ok(discount) => Self::Applied(discount),
            Err(message) => Self::Failed { message },
        };
    }

    /// Drop any applied, failed or in-flight discount.
    pub fn remove(&mut self) {
        *self = Self::Idle;
    }
}

/// `max(0, subtotal - discount)`. An over-large discount never produces a
/// negative payable total.
pub fn final_total(subtotal: i64, discount: Option<&AppliedDiscount>) -> i64 {
    let amount = discount.map(|d| d.discount_amount).unwrap_or(0);
    (subtotal - amount).max(0)
}
