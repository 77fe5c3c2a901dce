//! Aggregates module
pub mod cart;
pub mod discount;

pub use cart::{Cart, CartLine};
pub use discount::{final_total, AppliedDiscount, DiscountState};
