//! HTTP surface
//!
//! Session-scoped cart routes plus discount, checkout and template
//! resolution. The router lives in the library so tests can drive it
//! directly with `tower::ServiceExt`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::{
    CheckoutBackend, CreateSessionResponse, DiscountBackend, ValidateDiscountRequest,
};
use crate::checkout::{build_checkout_request, CustomerInfo};
use crate::domain::aggregates::{AppliedDiscount, CartLine};
use crate::domain::value_objects::{DiscountCode, LineKey, SessionId};
use crate::store::{CartStorage, CartStore, JsonFileStorage, MemoryStorage};
use crate::template::TemplateId;
use crate::StorefrontError;

/// Where per-session cart files live. Tests run against memory.
#[derive(Clone)]
enum StorageKind {
    Dir(PathBuf),
    Memory,
}

// Grows with every distinct session id and is never evicted; acceptable at
// this scale, but needs idle eviction or an LRU bound before carrying real
// multi-tenant traffic.
type Sessions = Arc<Mutex<HashMap<SessionId, Arc<Mutex<CartStore>>>>>;

#[derive(Clone)]
pub struct AppState {
    sessions: Sessions,
    storage: StorageKind,
    discounts: Arc<dyn DiscountBackend>,
    checkout: Arc<dyn CheckoutBackend>,
}

impl AppState {
    pub fn new(
        data_dir: PathBuf,
        discounts: Arc<dyn DiscountBackend>,
        checkout: Arc<dyn CheckoutBackend>,
    ) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            storage: StorageKind::Dir(data_dir),
            discounts,
            checkout,
        }
    }

    /// Memory-backed state for tests.
    pub fn in_memory(
        discounts: Arc<dyn DiscountBackend>,
        checkout: Arc<dyn CheckoutBackend>,
    ) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            storage: StorageKind::Memory,
            discounts,
            checkout,
        }
    }

    /// Fetch the session's store, creating and hydrating it on first touch.
    /// The [`SessionId`] charset guarantees the derived file name stays
    /// inside the data directory.
    async fn session(&self, session_id: &SessionId) -> Arc<Mutex<CartStore>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(store) = sessions.get(session_id) {
            return store.clone();
        }
        let storage: Box<dyn CartStorage> = match &self.storage {
            StorageKind::Dir(dir) => {
                Box::new(JsonFileStorage::new(dir.join(format!("{session_id}.json"))))
            }
            StorageKind::Memory => Box::new(MemoryStorage::new()),
        };
        let mut store = CartStore::new(storage);
        store.hydrate();
        let store = Arc::new(Mutex::new(store));
        sessions.insert(session_id.clone(), store.clone());
        store
    }
}

/// Reject malformed session ids before any storage is touched.
fn parse_session(raw: &str) -> Result<SessionId, ApiError> {
    SessionId::new(raw).map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }),
        )
        .route("/api/v1/cart", post(create_session_id))
        .route("/api/v1/cart/:session", get(get_cart).delete(clear_cart))
        .route(
            "/api/v1/cart/:session/items",
            post(add_item).put(update_quantity).delete(remove_item),
        )
        .route(
            "/api/v1/cart/:session/discount",
            post(apply_discount).delete(remove_discount),
        )
        .route("/api/v1/cart/:session/checkout", post(create_checkout_session))
        .route("/api/v1/templates/:template_id", get(resolve_template))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

pub struct ApiError {
    status: StatusCode,
    message: String,
    unavailable_items: Option<Vec<String>>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), unavailable_items: None }
    }
}

impl From<StorefrontError> for ApiError {
    fn from(e: StorefrontError) -> Self {
        let status = match &e {
            StorefrontError::LineNotFound => StatusCode::NOT_FOUND,
            StorefrontError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StorefrontError::ValidationInProgress => StatusCode::CONFLICT,
            StorefrontError::Backend(_) => StatusCode::BAD_GATEWAY,
            StorefrontError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "unavailable_items": self.unavailable_items,
        });
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CartSnapshot {
    pub items: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: i64,
    pub discount: Option<AppliedDiscount>,
    pub final_total: i64,
}

impl CartSnapshot {
    fn of(store: &CartStore) -> Self {
        Self {
            items: store.items().to_vec(),
            item_count: store.item_count(),
            subtotal: store.subtotal(),
            discount: store.discount().cloned(),
            final_total: store.final_total(),
        }
    }
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub price: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    pub max_inventory: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
}

/// Quantity arrives signed so a negative value can mean "remove" rather
/// than a deserialization error.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApplyDiscountRequest {
    pub code: String,
    pub business_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub business_id: String,
    pub customer_info: CustomerInfo,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_url: String,
}

// =============================================================================
// Handlers
// =============================================================================

fn log_events(session: &SessionId, store: &mut CartStore) {
    for event in store.take_events() {
        tracing::info!(session = session.as_str(), ?event, "cart event");
    }
}

/// Mint a session identifier for a fresh browser. The cart itself is
/// created lazily on the first mutation against it.
async fn create_session_id() -> (StatusCode, Json<serde_json::Value>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    (StatusCode::CREATED, Json(serde_json::json!({ "session_id": session_id })))
}

async fn get_cart(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let session = parse_session(&session)?;
    let store = s.session(&session).await;
    let store = store.lock().await;
    Ok(Json(CartSnapshot::of(&store)))
}

async fn add_item(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartSnapshot>), ApiError> {
    let session = parse_session(&session)?;
    if r.price < 0 {
        return Err(ApiError::from(StorefrontError::Validation(
            "Price cannot be negative".into(),
        )));
    }
    let line = CartLine {
        product_id: r.product_id,
        variant_id: r.variant_id,
        product_name: r.product_name,
        variant_name: r.variant_name,
        price: r.price,
        quantity: r.quantity,
        image_url: r.image_url,
        sku: r.sku,
        max_inventory: r.max_inventory,
    };
    let store = s.session(&session).await;
    let mut store = store.lock().await;
    let quantity = r.quantity;
    store.add_item(line, quantity);
    log_events(&session, &mut store);
    Ok((StatusCode::CREATED, Json(CartSnapshot::of(&store))))
}

async fn update_quantity(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<UpdateQuantityRequest>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let session = parse_session(&session)?;
    let key = LineKey::new(r.product_id, r.variant_id);
    let store = s.session(&session).await;
    let mut store = store.lock().await;
    // Zero and below both remove the line; oversized values clamp against
    // the line's inventory cap inside the aggregate.
    let quantity = if r.quantity <= 0 {
        0
    } else {
        u32::try_from(r.quantity).unwrap_or(u32::MAX)
    };
    store.update_quantity(&key, quantity)?;
    log_events(&session, &mut store);
    Ok(Json(CartSnapshot::of(&store)))
}

async fn remove_item(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<LineRequest>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let session = parse_session(&session)?;
    let key = LineKey::new(r.product_id, r.variant_id);
    let store = s.session(&session).await;
    let mut store = store.lock().await;
    store.remove_item(&key);
    log_events(&session, &mut store);
    Ok(Json(CartSnapshot::of(&store)))
}

async fn clear_cart(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let session = parse_session(&session)?;
    let store = s.session(&session).await;
    let mut store = store.lock().await;
    store.clear();
    log_events(&session, &mut store);
    Ok(Json(CartSnapshot::of(&store)))
}

async fn apply_discount(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<ApplyDiscountRequest>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let session = parse_session(&session)?;
    let code = DiscountCode::new(r.code)
        .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let store = s.session(&session).await;
    let mut store = store.lock().await;
    store.begin_discount_validation(code.clone())?;

    // The session lock is held across the call, so the settle below always
    // matches the validation begun above.
    let request = ValidateDiscountRequest {
        code: code.as_str().to_string(),
        business_id: r.business_id,
        cart_total: store.subtotal(),
    };
    match s.discounts.validate(request).await {
        Ok(response) if response.valid => {
            let discount = response.discount.ok_or_else(|| {
                store.settle_discount(Err("Invalid discount code".into()));
                ApiError::new(StatusCode::BAD_GATEWAY, "Backend returned no discount")
            })?;
            store.settle_discount(Ok(discount));
            log_events(&session, &mut store);
            Ok(Json(CartSnapshot::of(&store)))
        }
        Ok(response) => {
            let message = response.error.unwrap_or_else(|| "Invalid discount code".to_string());
            store.settle_discount(Err(message.clone()));
            Err(ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, message))
        }
        Err(e) => {
            tracing::warn!(session = session.as_str(), error = %e, "discount validation failed");
            let message = "Unable to validate discount code. Please try again.".to_string();
            store.settle_discount(Err(message.clone()));
            Err(ApiError::new(StatusCode::BAD_GATEWAY, message))
        }
    }
}

async fn remove_discount(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let session = parse_session(&session)?;
    let store = s.session(&session).await;
    let mut store = store.lock().await;
    store.remove_discount();
    log_events(&session, &mut store);
    Ok(Json(CartSnapshot::of(&store)))
}

async fn create_checkout_session(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let session = parse_session(&session)?;
    let store = s.session(&session).await;
    let store = store.lock().await;

    // Local preconditions first; nothing reaches the backend on failure.
    let request = build_checkout_request(
        &r.business_id,
        store.items(),
        &r.customer_info,
        store.discount(),
    )?;

    match s.checkout.create_session(request).await {
        Ok(CreateSessionResponse::Ready { session_url }) => {
            tracing::info!(session = session.as_str(), "checkout session created");
            Ok(Json(CheckoutResponse { session_url }))
        }
        // The cart is left intact so the shopper can adjust quantities.
        Ok(CreateSessionResponse::Rejected { error, unavailable_items }) => Err(ApiError {
            status: StatusCode::CONFLICT,
            message: error,
            unavailable_items,
        }),
        Err(e) => {
            tracing::warn!(session = session.as_str(), error = %e, "checkout session creation failed");
            Err(ApiError::new(
                StatusCode::BAD_GATEWAY,
                "Unable to start checkout. Please try again.",
            ))
        }
    }
}

async fn resolve_template(
    Path(template_id): Path<String>,
) -> Json<crate::template::TemplateManifest> {
    // Lossy resolve: unknown or legacy identifiers get the default theme.
    Json(TemplateId::resolve(&template_id).manifest())
}
