//! HTTP API for the storefront daemon.
//!
//! Provides REST endpoints for:
//! - Health check and Prometheus metrics
//! - Cart maintenance
//! - Checkout and cancellation
//! - Gateway status callbacks
//! - Customer and merchant read models

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use storefront_connectors::verify_notification;
use storefront_domain::{CartItem, Customer, GatewayOrderId, ShippingAddress};
use storefront_exec::{
    CallbackReconciler, CartService, CheckoutOrchestrator, ErrorKind, ExecError, MerchantOrders,
    PaymentGateway, Queries, Reconciliation, StatusNotification, TransactionCanceller,
    TransactionSummary,
};
use storefront_store::Store;

use crate::metrics::Metrics;

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<G: PaymentGateway + 'static, S: Store + 'static> {
    pub checkout: CheckoutOrchestrator<G, S>,
    pub reconciler: CallbackReconciler<G, S>,
    pub canceller: TransactionCanceller<G, S>,
    pub carts: CartService<S>,
    pub queries: Queries<S>,
    pub metrics: Arc<Metrics>,
    /// Verifies callback signatures when set
    pub server_key: Option<String>,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Request to put a product in the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Request to change a cart quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Cart after a cart operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CartResponse {
    pub customer_id: Uuid,
    pub items: Vec<CartItem>,
}

/// Request to check out the whole cart.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
}

/// Response after deleting a product.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteProductResponse {
    pub product_id: Uuid,
    pub carts_updated: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<G, S>(state: Arc<ApiState<G, S>>) -> Router
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler::<G, S>))
        .route("/customers/:id", get(customer_handler::<G, S>))
        .route("/customers/:id/cart", post(add_to_cart_handler::<G, S>))
        .route(
            "/customers/:id/cart/:product_id",
            put(update_quantity_handler::<G, S>).delete(remove_from_cart_handler::<G, S>),
        )
        .route("/customers/:id/checkout", post(checkout_handler::<G, S>))
        .route("/customers/:id/transactions/:txn_id/cancel", post(cancel_handler::<G, S>))
        .route("/payments/callback", post(callback_handler::<G, S>))
        .route("/merchants/:id/orders", get(merchant_orders_handler::<G, S>))
        .route("/products/:id", delete(delete_product_handler::<G, S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Prometheus text exposition.
async fn metrics_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
) -> Result<([(header::HeaderName, String); 1], String), ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    let (content_type, body) = state.metrics.encode().map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {}", e))
    })?;
    Ok(([(header::CONTENT_TYPE, content_type)], body))
}

async fn customer_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    let customer = state.queries.customer(id).await.map_err(exec_error_response)?;
    Ok(Json(customer))
}

async fn add_to_cart_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    let items = state
        .carts
        .add_to_cart(id, req.product_id, req.quantity)
        .await
        .map_err(exec_error_response)?;
    Ok(Json(CartResponse { customer_id: id, items }))
}

async fn update_quantity_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    let items = state
        .carts
        .update_quantity(id, product_id, req.quantity)
        .await
        .map_err(exec_error_response)?;
    Ok(Json(CartResponse { customer_id: id, items }))
}

async fn remove_from_cart_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CartResponse>, ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    let items = state.carts.remove_from_cart(id, product_id).await.map_err(exec_error_response)?;
    Ok(Json(CartResponse { customer_id: id, items }))
}

/// Check out the customer's cart.
async fn checkout_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<TransactionSummary>), ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    match state.checkout.create(id, req.shipping_address).await {
        Ok(summary) => {
            state.metrics.record_checkout("created");
            Ok((StatusCode::CREATED, Json(summary)))
        },
        Err(e) => {
            state.metrics.record_checkout(kind_label(e.kind()));
            Err(exec_error_response(e))
        },
    }
}

/// Ask the gateway to cancel a pending transaction.
async fn cancel_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Path((id, txn_id)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    let transaction_id = GatewayOrderId::new(txn_id)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    state.canceller.cancel(id, &transaction_id).await.map_err(exec_error_response)?;

    Ok(StatusCode::ACCEPTED)
}

/// Gateway status notification.
async fn callback_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Json(notification): Json<StatusNotification>,
) -> Result<Json<Reconciliation>, ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    if let Some(server_key) = &state.server_key {
        if !signature_valid(&notification, server_key) {
            warn!(order_id = %notification.order_id, "Callback signature rejected");
            state.metrics.record_callback("unauthorized");
            return Err(error_response(StatusCode::UNAUTHORIZED, "Invalid callback signature"));
        }
    }

    match state.reconciler.callback(&notification).await {
        Ok(reconciliation) => {
            state.metrics.record_callback(reconciliation.label());
            Ok(Json(reconciliation))
        },
        Err(e) => {
            state.metrics.record_callback(kind_label(e.kind()));
            Err(exec_error_response(e))
        },
    }
}

async fn merchant_orders_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MerchantOrders>, ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    let orders = state.queries.merchant_orders(id).await.map_err(exec_error_response)?;
    Ok(Json(orders))
}

async fn delete_product_handler<G, S>(
    State(state): State<Arc<ApiState<G, S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteProductResponse>, ApiError>
where
    G: PaymentGateway + 'static,
    S: Store + 'static,
{
    let carts_updated = state.carts.delete_product(id).await.map_err(exec_error_response)?;
    Ok(Json(DeleteProductResponse { product_id: id, carts_updated }))
}

// =============================================================================
// Helpers
// =============================================================================

fn signature_valid(notification: &StatusNotification, server_key: &str) -> bool {
    match (
        notification.status_code.as_deref(),
        notification.gross_amount.as_deref(),
        notification.signature_key.as_deref(),
    ) {
        (Some(status_code), Some(gross_amount), Some(signature)) => verify_notification(
            &notification.order_id,
            status_code,
            gross_amount,
            signature,
            server_key,
        ),
        _ => false,
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::Validation => "invalid",
        ErrorKind::Upstream => "upstream_error",
        ErrorKind::Timeout => "timeout",
        ErrorKind::Internal => "internal_error",
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

fn exec_error_response(error: ExecError) -> ApiError {
    let status = match error.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        warn!(error = %error, "Request failed");
    }

    error_response(status, error.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;
    use storefront_connectors::notification_signature;
    use storefront_exec::StubGateway;
    use storefront_store::MemoryStore;
    use storefront_testkit::{seed_customer_with_cart, shipping_address, Catalog};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        gateway: Arc<StubGateway>,
        store: Arc<MemoryStore>,
    }

    fn create_test_app(server_key: Option<&str>) -> TestApp {
        let gateway = Arc::new(StubGateway::new());
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(ApiState {
            checkout: CheckoutOrchestrator::new(gateway.clone(), store.clone()),
            reconciler: CallbackReconciler::new(gateway.clone(), store.clone()),
            canceller: TransactionCanceller::new(gateway.clone(), store.clone()),
            carts: CartService::new(store.clone()),
            queries: Queries::new(store.clone()),
            metrics: Arc::new(Metrics::new().unwrap()),
            server_key: server_key.map(str::to_string),
        });
        TestApp { router: create_router(state), gateway, store }
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(None);

        let (status, body) = send(&app.router, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_unknown_customer_is_404() {
        let app = create_test_app(None);

        let (status, _) = send(&app.router, "GET", &format!("/customers/{}", Uuid::now_v7()), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cart_checkout_callback_flow() {
        let app = create_test_app(None);
        let catalog = Catalog::seed(app.store.as_ref(), "Arabica", dec!(30000), 5).await.unwrap();
        let customer = seed_customer_with_cart(app.store.as_ref(), "Budi", &[]).await.unwrap();

        let (status, body) = send(
            &app.router,
            "POST",
            &format!("/customers/{}/cart", customer.id),
            Some(serde_json::json!({"product_id": catalog.product.id, "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cart: CartResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(cart.items.len(), 1);

        app.gateway.set_next_order_id("T1");
        let (status, body) = send(
            &app.router,
            "POST",
            &format!("/customers/{}/checkout", customer.id),
            Some(serde_json::json!({"shipping_address": shipping_address()})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let summary: TransactionSummary = serde_json::from_slice(&body).unwrap();
        assert_eq!(summary.transaction_id.as_str(), "T1");

        app.gateway.set_status("T1", "settlement", None);
        let (status, _) = send(
            &app.router,
            "POST",
            "/payments/callback",
            Some(serde_json::json!({"order_id": "T1", "transaction_status": "settlement"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app.router, "GET", &format!("/merchants/{}/orders", catalog.merchant.id), None).await;
        assert_eq!(status, StatusCode::OK);
        let orders: MerchantOrders = serde_json::from_slice(&body).unwrap();
        assert_eq!(orders.balance, dec!(60000));

        let (_, body) = send(&app.router, "GET", "/metrics", None).await;
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("storefront_checkouts_total{result=\"created\"} 1"));
        assert!(text.contains("storefront_callbacks_total{outcome=\"settled\"} 1"));
    }

    #[tokio::test]
    async fn test_over_stock_checkout_is_400() {
        let app = create_test_app(None);
        let catalog = Catalog::seed(app.store.as_ref(), "Arabica", dec!(30000), 5).await.unwrap();
        let customer = seed_customer_with_cart(app.store.as_ref(), "Budi", &[(catalog.product.id, 6)])
            .await
            .unwrap();

        let (status, _) = send(
            &app.router,
            "POST",
            &format!("/customers/{}/checkout", customer.id),
            Some(serde_json::json!({"shipping_address": shipping_address()})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.gateway.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_502() {
        let app = create_test_app(None);
        let catalog = Catalog::seed(app.store.as_ref(), "Arabica", dec!(30000), 5).await.unwrap();
        let customer = seed_customer_with_cart(app.store.as_ref(), "Budi", &[(catalog.product.id, 1)])
            .await
            .unwrap();
        app.gateway.set_fail_next(true);

        let (status, _) = send(
            &app.router,
            "POST",
            &format!("/customers/{}/checkout", customer.id),
            Some(serde_json::json!({"shipping_address": shipping_address()})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_cancel_unknown_transaction_is_404() {
        let app = create_test_app(None);
        let customer = seed_customer_with_cart(app.store.as_ref(), "Budi", &[]).await.unwrap();

        let (status, _) = send(
            &app.router,
            "POST",
            &format!("/customers/{}/transactions/UNKNOWN/cancel", customer.id),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(app.gateway.cancel_calls(), 0);
    }

    #[tokio::test]
    async fn test_callback_signature_enforced() {
        let app = create_test_app(Some("SB-Mid-server-test"));

        let (status, _) = send(
            &app.router,
            "POST",
            "/payments/callback",
            Some(serde_json::json!({
                "order_id": "T1",
                "status_code": "200",
                "gross_amount": "60000.00",
                "signature_key": "forged"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(app.gateway.check_calls(), 0);

        // Valid signature passes the middleware; the unknown order then fails upstream
        let signature = notification_signature("T1", "200", "60000.00", "SB-Mid-server-test");
        let (status, _) = send(
            &app.router,
            "POST",
            "/payments/callback",
            Some(serde_json::json!({
                "order_id": "T1",
                "status_code": "200",
                "gross_amount": "60000.00",
                "signature_key": signature
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(app.gateway.check_calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_product_endpoint() {
        let app = create_test_app(None);
        let catalog = Catalog::seed(app.store.as_ref(), "Arabica", dec!(30000), 5).await.unwrap();
        seed_customer_with_cart(app.store.as_ref(), "Budi", &[(catalog.product.id, 1)]).await.unwrap();

        let (status, body) =
            send(&app.router, "DELETE", &format!("/products/{}", catalog.product.id), None).await;

        assert_eq!(status, StatusCode::OK);
        let deleted: DeleteProductResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(deleted.carts_updated, 1);
    }
}
