//! Order ledger error types.

use common::{OrderId, ProductId};
use stock::StockError;
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The actor may not perform this operation.
    #[error("Not authorized for this order")]
    Forbidden,

    /// An order must contain at least one line item.
    #[error("Order has no items")]
    EmptyOrder,

    /// Line quantities must be at least one.
    #[error("Invalid quantity {quantity} for {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// The requested status change is not legal per the state graph.
    #[error("Cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Error from the stock ledger (including insufficient stock).
    #[error(transparent)]
    Stock(#[from] StockError),
}

/// Convenience type alias for order results.
pub type Result<T> = std::result::Result<T, OrderError>;
