//! Domain events
//!
//! Raised by the cart store on every mutation and drained by the caller,
//! which currently feeds them into structured logging.

use crate::domain::value_objects::LineKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded { key: LineKey, quantity: u32 },
    ItemRemoved { key: LineKey },
    QuantityChanged { key: LineKey, quantity: u32 },
    Cleared,
    DiscountApplied { code: String, discount_amount: i64 },
    DiscountRemoved,
}
