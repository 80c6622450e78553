//! Outbox error types.

use common::NotificationId;
use thiserror::Error;

/// Errors from outbox operations.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// No entry with this id.
    #[error("Notification not found: {0}")]
    NotFound(NotificationId),

    /// The notification request was malformed.
    #[error("Invalid notification: {0}")]
    InvalidNotification(&'static str),
}

/// Convenience type alias for outbox results.
pub type Result<T> = std::result::Result<T, OutboxError>;
