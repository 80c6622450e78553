//! Payment endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use common::{Money, OrderId, PaymentId};
use payments::{
    Channel, Payment, PaymentFilter, PaymentOutcome, PaymentPage, PaymentStats, PaymentStatus,
    ReceiptMethod, SettlementOutcome,
};
use saga::SagaReport;
use serde::{Deserialize, Serialize};

use crate::auth::actor_from_headers;
use crate::error::ApiError;
use crate::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct InitiateRequest {
    pub order_id: OrderId,
    pub amount_cents: i64,
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    "mock".to_string()
}

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub reference: String,
    pub status: PaymentOutcome,
}

#[derive(Deserialize)]
pub struct OfflineRequest {
    pub order_id: OrderId,
    pub amount_cents: i64,
    pub method: ReceiptMethod,
    pub reference: String,
    pub attachment_url: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<PaymentStatus>,
    pub channel: Option<Channel>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

// -- Response types --

#[derive(Serialize)]
pub struct SettlementResponse {
    pub payment: Payment,
    /// True when this delivery was a replay absorbed without effect.
    pub idempotent: bool,
    /// Fulfillment step report, present when this call applied a success.
    pub fulfillment: Option<SagaReport>,
}

impl From<SettlementOutcome> for SettlementResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            payment: outcome.payment,
            idempotent: outcome.idempotent,
            fulfillment: outcome.report,
        }
    }
}

// -- Handlers --

/// POST /payments/initiate — start an online payment for an order.
///
/// The order id is an opaque reference here; the ledger does not consult the
/// order service at initiation.
#[tracing::instrument(skip(state, headers, req))]
pub async fn initiate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<InitiateRequest>,
) -> Result<Json<Payment>, ApiError> {
    actor_from_headers(&headers)?;

    let payment = state
        .payments
        .initiate(req.order_id, Money::from_cents(req.amount_cents), &req.provider)
        .await?;
    Ok(Json(payment))
}

/// POST /payments/webhook — provider callback, delivered at-least-once.
///
/// Unauthenticated by design: the reference is the capability, and replays
/// are absorbed idempotently.
#[tracing::instrument(skip(state, req), fields(reference = %req.reference))]
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WebhookRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let outcome = state.payments.webhook(&req.reference, req.status).await?;
    Ok(Json(outcome.into()))
}

/// POST /payments/offline — submit an offline payment for verification.
#[tracing::instrument(skip(state, headers, req))]
pub async fn offline(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<OfflineRequest>,
) -> Result<Json<Payment>, ApiError> {
    actor_from_headers(&headers)?;

    let payment = state
        .payments
        .offline(
            req.order_id,
            Money::from_cents(req.amount_cents),
            req.method,
            &req.reference,
            req.attachment_url,
        )
        .await?;
    Ok(Json(payment))
}

/// POST /payments/:id/verify — manual verification decision (admin only).
#[tracing::instrument(skip(state, headers, req))]
pub async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    if !actor.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    let payment_id = parse_payment_id(&id)?;
    let outcome = state.payments.verify(payment_id, req.approved).await?;
    Ok(Json(outcome.into()))
}

/// GET /payments/by-order/:order_id — list an order's payment attempts.
#[tracing::instrument(skip(state, headers))]
pub async fn by_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let order_id: OrderId = order_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid order id".to_string()))?;
    // Ownership check rides on order visibility.
    state.orders.get(&actor, order_id).await?;

    let payments = state.payments.list_by_order(order_id).await?;
    Ok(Json(payments))
}

/// GET /payments/all — paginated listing with filters (admin only).
#[tracing::instrument(skip(state, headers))]
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<PaymentPage>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    if !actor.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    let filter = PaymentFilter {
        status: query.status,
        channel: query.channel,
    };
    let page = state
        .payments
        .list(&filter, query.page, query.per_page.clamp(1, 100))
        .await?;
    Ok(Json(page))
}

/// GET /payments/stats — aggregate statistics (admin only).
#[tracing::instrument(skip(state, headers))]
pub async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PaymentStats>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    if !actor.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    Ok(Json(state.payments.stats().await?))
}

fn parse_payment_id(id: &str) -> Result<PaymentId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid payment id: {id}")))
}
