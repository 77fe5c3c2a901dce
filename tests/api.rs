//! Router-level tests with mock backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront::api::{router, AppState};
use storefront::backend::{
    CheckoutBackend, CreateSessionRequest, CreateSessionResponse, DiscountBackend,
    ValidateDiscountRequest, ValidateDiscountResponse,
};
use storefront::domain::aggregates::AppliedDiscount;
use storefront::{Result, StorefrontError};

#[derive(Default)]
struct MockBackend {
    discount_calls: AtomicUsize,
    checkout_calls: AtomicUsize,
    seen_codes: Mutex<Vec<String>>,
    discount_response: Mutex<Option<Result<ValidateDiscountResponse>>>,
    checkout_response: Mutex<Option<Result<CreateSessionResponse>>>,
}

impl MockBackend {
    fn with_discount(self, response: Result<ValidateDiscountResponse>) -> Self {
        *self.discount_response.lock().unwrap() = Some(response);
        self
    }

    fn with_checkout(self, response: Result<CreateSessionResponse>) -> Self {
        *self.checkout_response.lock().unwrap() = Some(response);
        self
    }
}

#[async_trait]
impl DiscountBackend for MockBackend {
    async fn validate(&self, request: ValidateDiscountRequest) -> Result<ValidateDiscountResponse> {
        self.discount_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_codes.lock().unwrap().push(request.code);
        self.discount_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(ValidateDiscountResponse {
                valid: false,
                discount: None,
                error: Some("Invalid discount code".into()),
            }))
    }
}

#[async_trait]
impl CheckoutBackend for MockBackend {
    async fn create_session(&self, _request: CreateSessionRequest) -> Result<CreateSessionResponse> {
        self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        self.checkout_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(CreateSessionResponse::Ready {
                session_url: "https://pay.example/cs_default".into(),
            }))
    }
}

fn app(backend: Arc<MockBackend>) -> Router {
    router(AppState::in_memory(backend.clone(), backend))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder().method(method).uri(uri).body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn widget(quantity: u32) -> Value {
    json!({
        "product_id": "prod_1",
        "product_name": "Widget",
        "price": 10000,
        "quantity": quantity,
    })
}

#[tokio::test]
async fn health_reports_service_name() {
    let app = app(Arc::new(MockBackend::default()));
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "storefront");
}

#[tokio::test]
async fn minting_a_session_id_returns_created() {
    let app = app(Arc::new(MockBackend::default()));
    let (status, body) = send(&app, "POST", "/api/v1/cart", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["session_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn add_merges_and_reports_derived_totals() {
    let app = app(Arc::new(MockBackend::default()));
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(2))).await;
    let (status, body) = send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(3))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["item_count"], 5);
    assert_eq!(body["subtotal"], 50000);
    assert_eq!(body["final_total"], 50000);
}

#[tokio::test]
async fn add_clamps_to_advisory_inventory() {
    let app = app(Arc::new(MockBackend::default()));
    let mut item = widget(3);
    item["max_inventory"] = json!(4);
    send(&app, "POST", "/api/v1/cart/s1/items", Some(item.clone())).await;
    let (_, body) = send(&app, "POST", "/api/v1/cart/s1/items", Some(item)).await;
    assert_eq!(body["item_count"], 4);
}

#[tokio::test]
async fn zero_and_negative_quantities_remove_the_line() {
    let app = app(Arc::new(MockBackend::default()));
    for quantity in [0, -3] {
        send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(2))).await;
        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/cart/s1/items",
            Some(json!({"product_id": "prod_1", "quantity": quantity})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["items"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn update_of_missing_line_is_not_found() {
    let app = app(Arc::new(MockBackend::default()));
    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/cart/s1/items",
        Some(json!({"product_id": "ghost", "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_cart_checkout_short_circuits() {
    let backend = Arc::new(MockBackend::default());
    let app = app(backend.clone());
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/checkout",
        Some(json!({
            "business_id": "biz_1",
            "customer_info": {"email": "ada@example.com", "name": "Ada"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Your cart is empty");
    assert_eq!(backend.checkout_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn discount_round_trip() {
    let backend = Arc::new(MockBackend::default().with_discount(Ok(ValidateDiscountResponse {
        valid: true,
        discount: Some(AppliedDiscount {
            id: "d1".into(),
            code: "SAVE10".into(),
            discount_amount: 1000,
        }),
        error: None,
    })));
    let app = app(backend.clone());
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(1))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/discount",
        Some(json!({"code": "  save10 ", "business_id": "biz_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["final_total"], 9000);
    assert_eq!(body["discount"]["code"], "SAVE10");
    // Normalized before it reaches the backend.
    assert_eq!(backend.seen_codes.lock().unwrap().as_slice(), ["SAVE10"]);

    let (status, body) = send(&app, "DELETE", "/api/v1/cart/s1/discount", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["final_total"], 10000);
    assert!(body["discount"].is_null());
}

#[tokio::test]
async fn empty_discount_code_makes_no_backend_call() {
    let backend = Arc::new(MockBackend::default());
    let app = app(backend.clone());
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(1))).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/discount",
        Some(json!({"code": "   ", "business_id": "biz_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(backend.discount_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_discount_surfaces_backend_message() {
    let backend = Arc::new(MockBackend::default().with_discount(Ok(ValidateDiscountResponse {
        valid: false,
        discount: None,
        error: Some("This discount code has expired".into()),
    })));
    let app = app(backend);
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(1))).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/discount",
        Some(json!({"code": "OLD", "business_id": "biz_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "This discount code has expired");
}

#[tokio::test]
async fn transport_failure_is_retryable() {
    let backend = Arc::new(
        MockBackend::default().with_discount(Err(StorefrontError::Backend("connection refused".into()))),
    );
    let app = app(backend.clone());
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(1))).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/discount",
        Some(json!({"code": "SAVE10", "business_id": "biz_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    // The pending state settled, so a retry enters validation again.
    *backend.discount_response.lock().unwrap() = Some(Ok(ValidateDiscountResponse {
        valid: true,
        discount: Some(AppliedDiscount {
            id: "d1".into(),
            code: "SAVE10".into(),
            discount_amount: 1000,
        }),
        error: None,
    }));
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/discount",
        Some(json!({"code": "SAVE10", "business_id": "biz_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["final_total"], 9000);
}

#[tokio::test]
async fn checkout_redirects_to_payment_url() {
    let backend = Arc::new(MockBackend::default().with_checkout(Ok(CreateSessionResponse::Ready {
        session_url: "https://pay.example/cs_123".into(),
    })));
    let app = app(backend);
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(1))).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/checkout",
        Some(json!({
            "business_id": "biz_1",
            "customer_info": {"email": "ada@example.com", "name": "Ada"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_url"], "https://pay.example/cs_123");
}

#[tokio::test]
async fn unavailable_items_leave_cart_intact() {
    let backend =
        Arc::new(MockBackend::default().with_checkout(Ok(CreateSessionResponse::Rejected {
            error: "Some items are unavailable".into(),
            unavailable_items: Some(vec!["prod_1".into()]),
        })));
    let app = app(backend);
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(2))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/checkout",
        Some(json!({
            "business_id": "biz_1",
            "customer_info": {"email": "ada@example.com", "name": "Ada"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Some items are unavailable");
    assert_eq!(body["unavailable_items"][0], "prod_1");

    let (_, cart) = send(&app, "GET", "/api/v1/cart/s1", None).await;
    assert_eq!(cart["item_count"], 2);
}

#[tokio::test]
async fn invalid_contact_makes_no_backend_call() {
    let backend = Arc::new(MockBackend::default());
    let app = app(backend.clone());
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(1))).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/cart/s1/checkout",
        Some(json!({
            "business_id": "biz_1",
            "customer_info": {"email": "not-an-email", "name": "Ada"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(backend.checkout_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn clearing_the_cart_drops_the_discount() {
    let backend = Arc::new(MockBackend::default().with_discount(Ok(ValidateDiscountResponse {
        valid: true,
        discount: Some(AppliedDiscount {
            id: "d1".into(),
            code: "SAVE10".into(),
            discount_amount: 1000,
        }),
        error: None,
    })));
    let app = app(backend);
    send(&app, "POST", "/api/v1/cart/s1/items", Some(widget(1))).await;
    send(
        &app,
        "POST",
        "/api/v1/cart/s1/discount",
        Some(json!({"code": "SAVE10", "business_id": "biz_1"})),
    )
    .await;

    let (status, body) = send(&app, "DELETE", "/api/v1/cart/s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());
    assert!(body["discount"].is_null());
    assert_eq!(body["final_total"], 0);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let app = app(Arc::new(MockBackend::default()));
    send(&app, "POST", "/api/v1/cart/alice/items", Some(widget(1))).await;
    let (_, bob) = send(&app, "GET", "/api/v1/cart/bob", None).await;
    assert_eq!(bob["item_count"], 0);
}

#[tokio::test]
async fn traversal_session_id_is_rejected_before_storage() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("nested").join("carts");
    let backend = Arc::new(MockBackend::default());
    let app = router(AppState::new(data_dir.clone(), backend.clone(), backend));

    // Encoded `../../owned`: must never become a file name.
    let (status, body) =
        send(&app, "POST", "/api/v1/cart/..%2F..%2Fowned/items", Some(widget(1))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Session id contains invalid characters");
    assert!(!dir.path().join("owned.json").exists());
    assert!(!dir.path().join("nested").join("owned.json").exists());

    // A well-formed id still persists inside the data directory.
    let (status, _) = send(&app, "POST", "/api/v1/cart/s-1/items", Some(widget(1))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(data_dir.join("s-1.json").exists());
}

#[tokio::test]
async fn negative_price_is_rejected_at_the_wire() {
    let app = app(Arc::new(MockBackend::default()));
    let mut item = widget(1);
    item["price"] = json!(-500);
    let (status, body) = send(&app, "POST", "/api/v1/cart/s1/items", Some(item)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Price cannot be negative");

    let (_, cart) = send(&app, "GET", "/api/v1/cart/s1", None).await;
    assert_eq!(cart["item_count"], 0);
    assert_eq!(cart["subtotal"], 0);
}

#[tokio::test]
async fn unknown_template_resolves_to_default() {
    let app = app(Arc::new(MockBackend::default()));
    let (status, body) = send(&app, "GET", "/api/v1/templates/nonexistent", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "default");
    assert_eq!(body["pages"].as_array().unwrap().len(), 9);

    let (_, dark) = send(&app, "GET", "/api/v1/templates/dark-trend", None).await;
    assert_eq!(dark["id"], "dark-trend");
    assert_eq!(dark["dark_theme"], true);
}
