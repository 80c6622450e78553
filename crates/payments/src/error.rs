//! Payment ledger error types.

use common::{Money, PaymentId};
use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Payment not found by id.
    #[error("Payment not found: {0}")]
    NotFound(PaymentId),

    /// No payment carries this external reference.
    #[error("Unknown payment reference: {0}")]
    UnknownReference(String),

    /// A payment with this external reference already exists.
    #[error("Duplicate payment reference: {0}")]
    DuplicateReference(String),

    /// Payment amounts must be strictly positive.
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(Money),
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
