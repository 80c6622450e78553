//! Product catalog, stock adjustment, and the internal commit endpoint.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use stock::ProductRecord;

use crate::auth::{actor_from_headers, require_internal};
use crate::error::ApiError;
use crate::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct AdjustStockRequest {
    /// Signed quantity delta; negative values remove stock.
    pub delta: i64,
}

#[derive(Deserialize)]
pub struct CommitRequest {
    pub order_id: OrderId,
}

// -- Response types --

#[derive(Serialize)]
pub struct AdjustStockResponse {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CommitResponse {
    pub order_id: OrderId,
    /// False when the commit was a replay of an already-committed order.
    pub applied: bool,
}

// -- Handlers --

/// POST /products — register a product (admin only).
#[tracing::instrument(skip(state, headers, req))]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductRecord>), ApiError> {
    let actor = actor_from_headers(&headers)?;
    if !actor.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    let record = ProductRecord::new(
        req.product_id,
        req.name,
        Money::from_cents(req.unit_price_cents),
        req.quantity,
    );
    state.stock.insert_product(record.clone()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /products/:id — fetch one product record.
#[tracing::instrument(skip(state))]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductRecord>, ApiError> {
    let product_id = ProductId::new(id);
    let record = state
        .stock
        .get(&product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {product_id} not found")))?;
    Ok(Json(record))
}

/// PUT /products/:id/stock — apply a signed stock delta (admin only).
#[tracing::instrument(skip(state, headers, req))]
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<AdjustStockResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    if !actor.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    let product_id = ProductId::new(id);
    let quantity = state.stock.adjust(&product_id, req.delta).await?;
    Ok(Json(AdjustStockResponse {
        product_id: product_id.to_string(),
        quantity,
    }))
}

/// POST /internal/commit — finalize stock for an order (internal token).
///
/// Idempotent; the saga's commit step may deliver this more than once.
#[tracing::instrument(skip(state, headers, req))]
pub async fn commit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CommitRequest>,
) -> Result<Json<CommitResponse>, ApiError> {
    require_internal(&headers, &state.internal_token)?;

    let applied = state.stock.commit_order(req.order_id).await?;
    Ok(Json(CommitResponse {
        order_id: req.order_id,
        applied,
    }))
}
