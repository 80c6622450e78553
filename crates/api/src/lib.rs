//! HTTP API server for the order fulfillment ledgers.
//!
//! Exposes the order, payment, stock, and notification surfaces over REST,
//! with structured logging (tracing) and Prometheus metrics. Identity
//! arrives in headers from the authenticating proxy; collaborator services
//! use the shared internal token instead.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::OrderLedger;
use outbox::NotificationOutbox;
use payments::PaymentLedger;
use saga::SagaCoordinator;
use stock::StockStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orders: OrderLedger,
    pub payments: PaymentLedger,
    pub stock: Arc<dyn StockStore>,
    pub coordinator: SagaCoordinator,
    pub notifications: NotificationOutbox,
    pub internal_token: String,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::place))
        .route("/orders", get(routes::orders::list_own))
        .route("/orders/all", get(routes::orders::list_all))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/cancel", put(routes::orders::cancel))
        .route("/orders/{id}/status", put(routes::orders::set_status))
        .route("/payments/initiate", post(routes::payments::initiate))
        .route("/payments/webhook", post(routes::payments::webhook))
        .route("/payments/offline", post(routes::payments::offline))
        .route("/payments/{id}/verify", post(routes::payments::verify))
        .route("/payments/by-order/{order_id}", get(routes::payments::by_order))
        .route("/payments/all", get(routes::payments::list_all))
        .route("/payments/stats", get(routes::payments::stats))
        .route("/notify/email", post(routes::notify::email))
        .route("/notify/sms", post(routes::notify::sms))
        .route("/notify/pending", get(routes::notify::pending))
        .route("/notify/dispatch", post(routes::notify::dispatch))
        .route("/notify/retry/{id}", post(routes::notify::retry))
        .route("/products", post(routes::stock::create_product))
        .route("/products/{id}", get(routes::stock::get_product))
        .route("/products/{id}/stock", put(routes::stock::adjust_stock))
        .route("/internal/commit", post(routes::stock::commit))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default single-process application state: in-memory stores,
/// the saga wired to the in-process ledgers, and the simulated notification
/// transport.
pub fn create_default_state(
    stock: Arc<dyn StockStore>,
    internal_token: impl Into<String>,
) -> Arc<AppState> {
    use orders::InMemoryOrderStore;
    use outbox::{InMemoryOutboxStore, SimulatedSender};
    use payments::InMemoryPaymentStore;
    use saga::{LocalOrderStatusClient, LocalStockCommitClient};

    let orders = OrderLedger::new(Arc::new(InMemoryOrderStore::new()), stock.clone());

    let coordinator = SagaCoordinator::new(
        Arc::new(LocalOrderStatusClient::new(orders.clone())),
        Arc::new(LocalStockCommitClient::new(stock.clone())),
    );

    let payments = PaymentLedger::new(
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(coordinator.clone()),
    );

    let notifications = NotificationOutbox::new(
        Arc::new(InMemoryOutboxStore::new()),
        Arc::new(SimulatedSender::new()),
    );

    Arc::new(AppState {
        orders,
        payments,
        stock,
        coordinator,
        notifications,
        internal_token: internal_token.into(),
    })
}
