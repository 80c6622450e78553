//! Stock ledger error types.

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during stock operations.
#[derive(Debug, Error)]
pub enum StockError {
    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A product already exists under this identifier.
    #[error("Product already exists: {0}")]
    ProductExists(ProductId),

    /// A signed adjustment would drive the quantity below zero.
    #[error("Stock for {product_id} cannot go negative: have {available}, delta {delta}")]
    NegativeStock {
        product_id: ProductId,
        available: u32,
        delta: i64,
    },

    /// A placement debit exceeds the quantity on hand.
    #[error("Insufficient stock for {product_id}: have {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// Database error from the PostgreSQL store.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for stock results.
pub type Result<T> = std::result::Result<T, StockError>;
