//! Delivery transports.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::entry::OutboxEntry;

/// A failed delivery attempt; the reason is recorded on the entry.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SendError(pub String);

/// Transport that actually moves a notification.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Attempts to deliver one entry.
    async fn deliver(&self, entry: &OutboxEntry) -> Result<(), SendError>;
}

/// Sender that logs deliveries instead of calling a real provider.
///
/// Can be switched into a failing mode so tests and demos can exercise the
/// failure and retry paths.
#[derive(Clone, Default)]
pub struct SimulatedSender {
    failing: Arc<AtomicBool>,
}

impl SimulatedSender {
    /// Creates a sender that succeeds until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the sender between succeeding and failing every attempt.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationSender for SimulatedSender {
    async fn deliver(&self, entry: &OutboxEntry) -> Result<(), SendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SendError("simulated provider outage".to_string()));
        }
        info!(
            notification_id = %entry.id,
            channel = %entry.channel,
            recipient = %entry.recipient,
            "notification delivered"
        );
        Ok(())
    }
}
