//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orders::OrderError;
use outbox::OutboxError;
use payments::PaymentError;
use stock::StockError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The caller lacks the required capability.
    Forbidden(String),
    /// Order ledger error.
    Order(OrderError),
    /// Payment ledger error.
    Payment(PaymentError),
    /// Stock ledger error.
    Stock(StockError),
    /// Notification outbox error.
    Outbox(OutboxError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Stock(err) => stock_error_to_response(err),
            ApiError::Outbox(err) => outbox_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    match &err {
        OrderError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        OrderError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
        OrderError::EmptyOrder
        | OrderError::InvalidQuantity { .. }
        | OrderError::InvalidTransition { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderError::Stock(stock_err) => {
            let status = stock_error_status(stock_err);
            let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                "stock storage unavailable".to_string()
            } else {
                err.to_string()
            };
            (status, message)
        }
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match &err {
        PaymentError::NotFound(_) | PaymentError::UnknownReference(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        PaymentError::DuplicateReference(_) | PaymentError::InvalidAmount(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

fn stock_error_to_response(err: StockError) -> (StatusCode, String) {
    let status = stock_error_status(&err);
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "stock storage unavailable".to_string()
    } else {
        err.to_string()
    };
    (status, message)
}

fn stock_error_status(err: &StockError) -> StatusCode {
    match err {
        StockError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        StockError::ProductExists(_)
        | StockError::NegativeStock { .. }
        | StockError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
        StockError::Database(_) => {
            tracing::error!(error = %err, "stock database error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn outbox_error_to_response(err: OutboxError) -> (StatusCode, String) {
    match &err {
        OutboxError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        OutboxError::InvalidNotification(_) => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        ApiError::Stock(err)
    }
}

impl From<OutboxError> for ApiError {
    fn from(err: OutboxError) -> Self {
        ApiError::Outbox(err)
    }
}
