//! Value objects for the storefront slice

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discount code value object. Codes are normalized (trimmed, uppercased)
/// before they ever reach the backend; the backend is the authority on
/// whether a normalized code is actually redeemable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscountCode(String);

impl DiscountCode {
    pub fn new(value: impl Into<String>) -> Result<Self, DiscountCodeError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(DiscountCodeError::Empty);
        }
        if value.len() > 64 {
            return Err(DiscountCodeError::TooLong);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiscountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountCodeError {
    Empty,
    TooLong,
}

impl std::error::Error for DiscountCodeError {}
impl fmt::Display for DiscountCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Please enter a discount code"),
            Self::TooLong => write!(f, "Discount code too long"),
        }
    }
}

/// Session identifier as supplied by the browser. Doubles as the file name
/// for the session's persisted cart, so the charset is restricted: no path
/// separators, no dot segments, nothing outside `[A-Za-z0-9_-]`. Minted ids
/// are v4 UUIDs and always pass.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Result<Self, SessionIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SessionIdError::Empty);
        }
        if value.len() > 64 {
            return Err(SessionIdError::TooLong);
        }
        if !value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(SessionIdError::InvalidCharacter);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdError {
    Empty,
    TooLong,
    InvalidCharacter,
}

impl std::error::Error for SessionIdError {}
impl fmt::Display for SessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Session id is empty"),
            Self::TooLong => write!(f, "Session id too long"),
            Self::InvalidCharacter => write!(f, "Session id contains invalid characters"),
        }
    }
}

/// Identity of a cart line: one line per (product, variant) pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: String,
    pub variant_id: Option<String>,
}

impl LineKey {
    pub fn new(product_id: impl Into<String>, variant_id: Option<String>) -> Self {
        Self { product_id: product_id.into(), variant_id }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant_id {
            Some(v) => write!(f, "{}/{}", self.product_id, v),
            None => write!(f, "{}", self.product_id),
        }
    }
}
