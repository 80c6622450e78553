//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::UserId;
use metrics_exporter_prometheus::PrometheusHandle;
use stock::InMemoryStockStore;
use tower::ServiceExt;

const INTERNAL_TOKEN: &str = "test-internal-token";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let stock = Arc::new(InMemoryStockStore::new());
    let state = api::create_default_state(stock, INTERNAL_TOKEN);
    api::create_app(state, get_metrics_handle())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn admin() -> Vec<(&'static str, &'static str)> {
    vec![("X-User-Role", "admin")]
}

fn customer(user_id: &UserId) -> Vec<(&'static str, String)> {
    vec![("X-User-Id", user_id.to_string())]
}

async fn send_as_customer(
    app: &Router,
    method: &str,
    uri: &str,
    user_id: &UserId,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let headers = customer(user_id);
    let borrowed: Vec<(&str, &str)> = headers.iter().map(|(n, v)| (*n, v.as_str())).collect();
    send(app, method, uri, &borrowed, body).await
}

async fn seed_product(app: &Router, product_id: &str, price_cents: i64, quantity: u32) {
    let (status, _) = send(
        app,
        "POST",
        "/products",
        &admin(),
        Some(serde_json::json!({
            "product_id": product_id,
            "name": format!("Product {product_id}"),
            "unit_price_cents": price_cents,
            "quantity": quantity,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn place_order(app: &Router, user_id: &UserId, product_id: &str, quantity: u32) -> String {
    let (status, body) = send_as_customer(
        app,
        "POST",
        "/orders",
        user_id,
        Some(serde_json::json!({
            "items": [{ "product_id": product_id, "quantity": quantity }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "place failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check() {
    let app = setup();
    let (status, body) = send(&app, "GET", "/health", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn place_order_snapshots_prices_and_debits_stock() {
    let app = setup();
    seed_product(&app, "SKU-001", 1500, 10).await;
    let user_id = UserId::new();

    let (status, body) = send_as_customer(
        &app,
        "POST",
        "/orders",
        &user_id,
        Some(serde_json::json!({
            "items": [{ "product_id": "SKU-001", "quantity": 3 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["total_cents"], 4500);
    assert_eq!(body["items"][0]["unit_price_cents"], 1500);

    let (_, product) = send(&app, "GET", "/products/SKU-001", &[], None).await;
    assert_eq!(product["quantity"], 7);
}

#[tokio::test]
async fn placing_more_than_available_is_rejected() {
    let app = setup();
    seed_product(&app, "SKU-001", 1000, 2).await;
    let user_id = UserId::new();

    let (status, body) = send_as_customer(
        &app,
        "POST",
        "/orders",
        &user_id,
        Some(serde_json::json!({
            "items": [{ "product_id": "SKU-001", "quantity": 3 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Insufficient"));

    // Nothing was debited.
    let (_, product) = send(&app, "GET", "/products/SKU-001", &[], None).await;
    assert_eq!(product["quantity"], 2);
}

#[tokio::test]
async fn empty_order_is_rejected() {
    let app = setup();
    let user_id = UserId::new();
    let (status, _) = send_as_customer(
        &app,
        "POST",
        "/orders",
        &user_id,
        Some(serde_json::json!({ "items": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = setup();
    let user_id = UserId::new();
    let (status, _) = send_as_customer(
        &app,
        "POST",
        "/orders",
        &user_id,
        Some(serde_json::json!({
            "items": [{ "product_id": "SKU-MISSING", "quantity": 1 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn customers_see_only_their_own_orders() {
    let app = setup();
    seed_product(&app, "SKU-001", 1000, 10).await;
    let alice = UserId::new();
    let bob = UserId::new();

    let order_id = place_order(&app, &alice, "SKU-001", 1).await;

    // Bob cannot read Alice's order.
    let (status, _) =
        send_as_customer(&app, "GET", &format!("/orders/{order_id}"), &bob, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob's own listing is empty; Alice's has one.
    let (_, bob_orders) = send_as_customer(&app, "GET", "/orders", &bob, None).await;
    assert_eq!(bob_orders.as_array().unwrap().len(), 0);
    let (_, alice_orders) = send_as_customer(&app, "GET", "/orders", &alice, None).await;
    assert_eq!(alice_orders.as_array().unwrap().len(), 1);

    // The full listing requires the admin role.
    let (status, _) = send_as_customer(&app, "GET", "/orders/all", &bob, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, all) = send(&app, "GET", "/orders/all", &admin(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_identity_is_forbidden() {
    let app = setup();
    let (status, _) = send(&app, "GET", "/orders", &[], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cancel_restores_stock() {
    let app = setup();
    seed_product(&app, "SKU-001", 1000, 5).await;
    let user_id = UserId::new();
    let order_id = place_order(&app, &user_id, "SKU-001", 2).await;

    let (status, body) = send_as_customer(
        &app,
        "PUT",
        &format!("/orders/{order_id}/cancel"),
        &user_id,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (_, product) = send(&app, "GET", "/products/SKU-001", &[], None).await;
    assert_eq!(product["quantity"], 5);

    // A second cancel is an illegal transition.
    let (status, _) = send_as_customer(
        &app,
        "PUT",
        &format!("/orders/{order_id}/cancel"),
        &user_id,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_online_payment_flow() {
    let app = setup();
    seed_product(&app, "SKU-001", 2000, 10).await;
    let user_id = UserId::new();
    let order_id = place_order(&app, &user_id, "SKU-001", 2).await;

    // Initiate a payment for the order total.
    let (status, payment) = send_as_customer(
        &app,
        "POST",
        "/payments/initiate",
        &user_id,
        Some(serde_json::json!({ "order_id": order_id, "amount_cents": 4000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "initiated");
    let reference = payment["reference"].as_str().unwrap().to_string();

    // Provider webhook settles the payment and runs the saga.
    let (status, settled) = send(
        &app,
        "POST",
        "/payments/webhook",
        &[],
        Some(serde_json::json!({ "reference": reference, "status": "success" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["payment"]["status"], "success");
    assert_eq!(settled["idempotent"], false);
    assert_eq!(settled["fulfillment"]["order_status"]["outcome"], "completed");
    assert_eq!(settled["fulfillment"]["stock_commit"]["outcome"], "completed");

    // The order is now paid.
    let (_, order) =
        send_as_customer(&app, "GET", &format!("/orders/{order_id}"), &user_id, None).await;
    assert_eq!(order["status"], "paid");
}

#[tokio::test]
async fn replayed_webhook_is_idempotent() {
    let app = setup();
    seed_product(&app, "SKU-001", 1000, 10).await;
    let user_id = UserId::new();
    let order_id = place_order(&app, &user_id, "SKU-001", 1).await;

    let (_, payment) = send_as_customer(
        &app,
        "POST",
        "/payments/initiate",
        &user_id,
        Some(serde_json::json!({ "order_id": order_id, "amount_cents": 1000 })),
    )
    .await;
    let reference = payment["reference"].as_str().unwrap().to_string();
    let webhook = serde_json::json!({ "reference": reference, "status": "success" });

    let (status, first) = send(&app, "POST", "/payments/webhook", &[], Some(webhook.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["idempotent"], false);

    let (status, replay) = send(&app, "POST", "/payments/webhook", &[], Some(webhook)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["idempotent"], true);
    assert_eq!(replay["payment"]["status"], "success");
    assert!(replay["fulfillment"].is_null());
}

#[tokio::test]
async fn webhook_with_unknown_reference_is_not_found() {
    let app = setup();
    let (status, _) = send(
        &app,
        "POST",
        "/payments/webhook",
        &[],
        Some(serde_json::json!({ "reference": "PMT_0000000000000000", "status": "success" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn offline_payment_verified_by_admin() {
    let app = setup();
    seed_product(&app, "SKU-001", 3000, 10).await;
    let user_id = UserId::new();
    let order_id = place_order(&app, &user_id, "SKU-001", 1).await;

    let (status, payment) = send_as_customer(
        &app,
        "POST",
        "/payments/offline",
        &user_id,
        Some(serde_json::json!({
            "order_id": order_id,
            "amount_cents": 3000,
            "method": "bank_transfer",
            "reference": "TRX-99",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "awaiting_verification");
    let payment_id = payment["id"].as_str().unwrap().to_string();

    // Verification requires the admin role.
    let (status, _) = send_as_customer(
        &app,
        "POST",
        &format!("/payments/{payment_id}/verify"),
        &user_id,
        Some(serde_json::json!({ "approved": true })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, settled) = send(
        &app,
        "POST",
        &format!("/payments/{payment_id}/verify"),
        &admin(),
        Some(serde_json::json!({ "approved": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["payment"]["status"], "success");

    let (_, order) =
        send_as_customer(&app, "GET", &format!("/orders/{order_id}"), &user_id, None).await;
    assert_eq!(order["status"], "paid");
}

#[tokio::test]
async fn payment_listing_and_stats_are_admin_only() {
    let app = setup();
    let user_id = UserId::new();

    let (status, _) = send_as_customer(&app, "GET", "/payments/all", &user_id, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send_as_customer(&app, "GET", "/payments/stats", &user_id, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, page) = send(&app, "GET", "/payments/all?page=1&per_page=10", &admin(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
    let (status, _) = send(&app, "GET", "/payments/stats", &admin(), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_status_update_follows_the_graph() {
    let app = setup();
    seed_product(&app, "SKU-001", 1000, 5).await;
    let user_id = UserId::new();
    let order_id = place_order(&app, &user_id, "SKU-001", 1).await;

    // pending -> shipped skips paid and is rejected.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/orders/{order_id}/status"),
        &admin(),
        Some(serde_json::json!({ "status": "shipped" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Customers cannot set statuses at all.
    let (status, _) = send_as_customer(
        &app,
        "PUT",
        &format!("/orders/{order_id}/status"),
        &user_id,
        Some(serde_json::json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for next in ["paid", "shipped", "delivered"] {
        let (status, body) = send(
            &app,
            "PUT",
            &format!("/orders/{order_id}/status"),
            &admin(),
            Some(serde_json::json!({ "status": next })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], next);
    }
}

#[tokio::test]
async fn internal_token_authorizes_saga_endpoints() {
    let app = setup();
    seed_product(&app, "SKU-001", 1000, 5).await;
    let user_id = UserId::new();
    let order_id = place_order(&app, &user_id, "SKU-001", 1).await;

    // Wrong token is rejected.
    let (status, _) = send(
        &app,
        "POST",
        "/internal/commit",
        &[("X-Internal-Token", "wrong")],
        Some(serde_json::json!({ "order_id": order_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Right token commits, and a replay reports applied = false.
    let commit = serde_json::json!({ "order_id": order_id });
    let (status, first) = send(
        &app,
        "POST",
        "/internal/commit",
        &[("X-Internal-Token", INTERNAL_TOKEN)],
        Some(commit.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["applied"], true);

    let (_, replay) = send(
        &app,
        "POST",
        "/internal/commit",
        &[("X-Internal-Token", INTERNAL_TOKEN)],
        Some(commit),
    )
    .await;
    assert_eq!(replay["applied"], false);

    // The internal token can also drive the status endpoint.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/orders/{order_id}/status"),
        &[("X-Internal-Token", INTERNAL_TOKEN)],
        Some(serde_json::json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");
}

#[tokio::test]
async fn stock_adjust_is_admin_only_and_checked() {
    let app = setup();
    seed_product(&app, "SKU-001", 1000, 5).await;
    let user_id = UserId::new();

    let (status, _) = send_as_customer(
        &app,
        "PUT",
        "/products/SKU-001/stock",
        &user_id,
        Some(serde_json::json!({ "delta": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        "/products/SKU-001/stock",
        &admin(),
        Some(serde_json::json!({ "delta": -3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 2);

    // Underflow is rejected, not clamped.
    let (status, _) = send(
        &app,
        "PUT",
        "/products/SKU-001/stock",
        &admin(),
        Some(serde_json::json!({ "delta": -10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn notification_endpoints() {
    let app = setup();

    // Email with neither subject nor body is rejected.
    let (status, _) = send(
        &app,
        "POST",
        "/notify/email",
        &[],
        Some(serde_json::json!({ "to": "a@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A valid email goes straight to sent via the immediate attempt.
    let (status, entry) = send(
        &app,
        "POST",
        "/notify/email",
        &[],
        Some(serde_json::json!({
            "to": "a@example.com",
            "subject": "Order confirmed",
            "payload": { "order_id": "abc" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["status"], "sent");
    assert_eq!(entry["attempts"], 1);
    let id = entry["id"].as_str().unwrap().to_string();

    let (status, pending) = send(&app, "GET", "/notify/pending", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 0);

    // Retrying a sent entry just sends it again.
    let (status, retried) = send(&app, "POST", &format!("/notify/retry/{id}"), &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retried["attempts"], 2);

    // Unknown ids are 404.
    let missing = common::NotificationId::new();
    let (status, _) = send(&app, "POST", &format!("/notify/retry/{missing}"), &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // SMS requires a body.
    let (status, _) = send(
        &app,
        "POST",
        "/notify/sms",
        &[],
        Some(serde_json::json!({ "to": "+15550100", "body": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/notify/dispatch", &[], None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_placements_never_oversell() {
    let app = setup();
    seed_product(&app, "SKU-001", 1000, 1).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let user_id = UserId::new();
            send_as_customer(
                &app,
                "POST",
                "/orders",
                &user_id,
                Some(serde_json::json!({
                    "items": [{ "product_id": "SKU-001", "quantity": 1 }]
                })),
            )
            .await
            .0
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap() == StatusCode::CREATED {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let (_, product) = send(&app, "GET", "/products/SKU-001", &[], None).await;
    assert_eq!(product["quantity"], 0);
}
