//! Notification outbox endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use common::NotificationId;
use outbox::{DeliveryStatus, DispatchStats, OutboxEntry};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct EmailRequest {
    pub to: String,
    pub subject: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Deserialize)]
pub struct SmsRequest {
    pub to: String,
    pub body: String,
    #[serde(default)]
    pub payload: Value,
}

// -- Handlers --

/// POST /notify/email — enqueue an email and attempt delivery once.
#[tracing::instrument(skip(state, req))]
pub async fn email(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<OutboxEntry>, ApiError> {
    let entry = state
        .notifications
        .enqueue(OutboxEntry::email(req.to, req.subject, req.body, req.payload))
        .await?;
    Ok(Json(entry))
}

/// POST /notify/sms — enqueue an SMS and attempt delivery once.
#[tracing::instrument(skip(state, req))]
pub async fn sms(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SmsRequest>,
) -> Result<Json<OutboxEntry>, ApiError> {
    if req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("a body is required".to_string()));
    }
    let entry = state
        .notifications
        .enqueue(OutboxEntry::sms(req.to, req.body, req.payload))
        .await?;
    Ok(Json(entry))
}

/// GET /notify/pending — list undelivered entries, oldest first.
#[tracing::instrument(skip(state))]
pub async fn pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OutboxEntry>>, ApiError> {
    Ok(Json(state.notifications.list_pending().await?))
}

/// POST /notify/dispatch — attempt delivery of every pending entry.
#[tracing::instrument(skip(state))]
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DispatchStats>, ApiError> {
    Ok(Json(state.notifications.dispatch_pending().await?))
}

/// POST /notify/retry/:id — re-attempt one entry regardless of status.
///
/// Responds 500 with the entry when the retried delivery failed again, so
/// callers polling for recovery see the failure directly.
#[tracing::instrument(skip(state))]
pub async fn retry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<OutboxEntry>), ApiError> {
    let id: NotificationId = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid notification id".to_string()))?;

    let entry = state.notifications.retry(id).await?;
    let code = if entry.status == DeliveryStatus::Failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    Ok((code, Json(entry)))
}
