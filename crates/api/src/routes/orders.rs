//! Order endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use common::OrderId;
use orders::{Order, OrderStatus, PlaceLine};
use serde::{Deserialize, Serialize};

use crate::auth::{actor_from_headers, has_internal_token};
use crate::error::ApiError;
use crate::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<PlaceLineRequest>,
}

#[derive(Deserialize)]
pub struct PlaceLineRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub owner: String,
    pub status: OrderStatus,
    pub items: Vec<OrderLineResponse>,
    pub total_cents: i64,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total_cents = order.total_amount().cents();
        Self {
            id: order.id.to_string(),
            owner: order.owner.to_string(),
            status: order.status,
            items: order
                .items
                .into_iter()
                .map(|item| OrderLineResponse {
                    line_total_cents: item.total_price().cents(),
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                })
                .collect(),
            total_cents,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order for the acting customer.
#[tracing::instrument(skip(state, headers, req))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let actor = actor_from_headers(&headers)?;
    let lines = req
        .items
        .into_iter()
        .map(|line| PlaceLine::new(line.product_id, line.quantity))
        .collect();

    let order = state.orders.place(&actor, lines).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders — list the acting customer's own orders.
#[tracing::instrument(skip(state, headers))]
pub async fn list_own(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let orders = state.orders.list_own(&actor).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/all — list every order (admin only).
#[tracing::instrument(skip(state, headers))]
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let orders = state.orders.list_all(&actor).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/:id — fetch one order.
#[tracing::instrument(skip(state, headers))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get(&actor, order_id).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/:id/cancel — cancel an order, restoring its stock.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let order_id = parse_order_id(&id)?;
    let order = state.orders.cancel(&actor, order_id).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/:id/status — administrative status update.
///
/// Also accepts the shared internal token; the saga's mark-paid step lands
/// here when the order service is deployed separately.
#[tracing::instrument(skip(state, headers, req))]
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let actor = if has_internal_token(&headers, &state.internal_token) {
        common::Actor::Internal
    } else {
        actor_from_headers(&headers)?
    };

    let order_id = parse_order_id(&id)?;
    let order = state.orders.set_status(&actor, order_id, req.status).await?;
    Ok(Json(order.into()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid order id: {id}")))
}
