//! Persisted cart store
//!
//! Single source of truth for one session's cart. Wraps the [`Cart`]
//! aggregate and discount state behind a storage backend: state is loaded
//! once at hydration and written through synchronously after every
//! mutation. Losing an unsubmitted cart is low stakes, so storage failures
//! are logged and swallowed rather than surfaced to the shopper.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{final_total, AppliedDiscount, Cart, CartLine, DiscountState};
use crate::domain::events::CartEvent;
use crate::domain::value_objects::{DiscountCode, LineKey};
use crate::{Result, StorefrontError};

/// On-disk layout. Only line items persist; the applied discount is
/// session-scoped and re-validated next time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PersistedCart {
    pub items: Vec<CartLine>,
}

pub trait CartStorage: Send + Sync {
    /// `Ok(None)` means no cart has been persisted yet.
    fn load(&self) -> Result<Option<PersistedCart>>;
    fn save(&self, cart: &PersistedCart) -> Result<()>;
}

/// One JSON file per session.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedCart>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorefrontError::Storage(e.to_string())),
        };
        let cart = serde_json::from_str(&raw).map_err(|e| StorefrontError::Storage(e.to_string()))?;
        Ok(Some(cart))
    }

    fn save(&self, cart: &PersistedCart) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorefrontError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_string(cart).map_err(|e| StorefrontError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| StorefrontError::Storage(e.to_string()))
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<Option<PersistedCart>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedCart>> {
        Ok(self.state.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, cart: &PersistedCart) -> Result<()> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(cart.clone());
        Ok(())
    }
}

pub struct CartStore {
    cart: Cart,
    discount: DiscountState,
    storage: Box<dyn CartStorage>,
    hydrated: bool,
    events: Vec<CartEvent>,
}

impl CartStore {
    /// Construct an empty, not-yet-hydrated store. Callers must not treat
    /// counts or totals as definitive until [`hydrate`](Self::hydrate) has
    /// run.
    pub fn new(storage: Box<dyn CartStorage>) -> Self {
        Self {
            cart: Cart::new(),
            discount: DiscountState::default(),
            storage,
            hydrated: false,
            events: Vec::new(),
        }
    }

    /// Load persisted state into memory. A read failure is non-fatal: the
    /// store proceeds with an empty cart. Idempotent.
    pub fn hydrate(&mut self) {
        if self.hydrated {
            return;
        }
        match self.storage.load() {
            Ok(Some(persisted)) => {
                let mut cart = Cart::new();
                for line in persisted.items {
                    let quantity = line.quantity;
                    cart.add_item(line, quantity);
                }
                self.cart = cart;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to load persisted cart, starting empty");
            }
        }
        self.hydrated = true;
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn items(&self) -> &[CartLine] {
        self.cart.items()
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    pub fn subtotal(&self) -> i64 {
        self.cart.subtotal()
    }

    pub fn discount(&self) -> Option<&AppliedDiscount> {
        self.discount.applied()
    }

    pub fn final_total(&self) -> i64 {
        final_total(self.cart.subtotal(), self.discount.applied())
    }

    pub fn add_item(&mut self, line: CartLine, quantity: u32) {
        let key = line.key();
        self.cart.add_item(line, quantity);
        self.events.push(CartEvent::ItemAdded { key, quantity });
        self.persist();
    }

    pub fn remove_item(&mut self, key: &LineKey) {
        self.cart.remove_item(key);
        self.events.push(CartEvent::ItemRemoved { key: key.clone() });
        self.persist();
    }

    pub fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> Result<()> {
        self.cart.update_quantity(key, quantity)?;
        self.events.push(CartEvent::QuantityChanged { key: key.clone(), quantity });
        self.persist();
        Ok(())
    }

    /// Empty the cart and drop any applied discount.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.discount.remove();
        self.events.push(CartEvent::Cleared);
        self.persist();
    }

    pub fn begin_discount_validation(&mut self, code: DiscountCode) -> Result<()> {
        self.discount.begin_validation(code)
    }

    pub fn settle_discount(&mut self, outcome: std::result::Result<AppliedDiscount, String>) {
        if let Ok(discount) = &outcome {
            self.events.push(CartEvent::DiscountApplied {
                code: discount.code.clone(),
                discount_amount: discount.discount_amount,
            });
        }
        self.discount.settle(outcome);
    }

    pub fn remove_discount(&mut self) {
        self.discount.remove();
        self.events.push(CartEvent::DiscountRemoved);
    }

    pub fn take_events(&mut self) -> Vec<CartEvent> {
        std::mem::take(&mut self.events)
    }

    fn persist(&self) {
        let snapshot = PersistedCart { items: self.cart.items().to_vec() };
        if let Err(e) = self.storage.save(&snapshot) {
            tracing::warn!(error = %e, "failed to persist cart");
        }
    }
}
