//! Retry outbox for failed saga steps.
//!
//! Mirrors the notification outbox pattern: a failed downstream step is
//! recorded here instead of being lost, and [`SagaCoordinator::retry_pending`]
//! re-attempts it later.
//!
//! [`SagaCoordinator::retry_pending`]: crate::SagaCoordinator::retry_pending

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::Serialize;
use tokio::sync::Mutex;

/// The two downstream steps of the fulfillment saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    /// Mark the order `paid` on the order ledger.
    SetOrderPaid,
    /// Finalize the stock debit on the stock ledger.
    CommitStock,
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SagaStep::SetOrderPaid => write!(f, "set_order_paid"),
            SagaStep::CommitStock => write!(f, "commit_stock"),
        }
    }
}

/// One step waiting to be retried.
#[derive(Debug, Clone, Serialize)]
pub struct PendingStep {
    /// The order the step belongs to.
    pub order_id: OrderId,
    /// Which step failed.
    pub step: SagaStep,
    /// Attempts so far (the initial failed attempt counts as one).
    pub attempts: u32,
    /// Error text from the most recent attempt.
    pub last_error: String,
    /// When the step first failed.
    pub created_at: DateTime<Utc>,
}

/// In-process queue of saga steps awaiting retry.
///
/// One entry per (order, step): a repeat failure updates the existing entry
/// rather than queueing a duplicate, so retries never double-apply.
#[derive(Clone, Default)]
pub struct SagaOutbox {
    pending: Arc<Mutex<Vec<PendingStep>>>,
}

impl SagaOutbox {
    /// Creates a new empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed step for later retry.
    pub async fn record_failure(&self, order_id: OrderId, step: SagaStep, error: &str) {
        let mut pending = self.pending.lock().await;
        if let Some(existing) = pending
            .iter_mut()
            .find(|p| p.order_id == order_id && p.step == step)
        {
            existing.attempts += 1;
            existing.last_error = error.to_string();
        } else {
            pending.push(PendingStep {
                order_id,
                step,
                attempts: 1,
                last_error: error.to_string(),
                created_at: Utc::now(),
            });
        }
        metrics::gauge!("saga_outbox_pending").set(pending.len() as f64);
    }

    /// Drains every pending step for re-attempt.
    pub async fn take_all(&self) -> Vec<PendingStep> {
        let mut pending = self.pending.lock().await;
        metrics::gauge!("saga_outbox_pending").set(0.0);
        std::mem::take(&mut *pending)
    }

    /// Puts a still-failing step back into the queue.
    pub async fn put_back(&self, step: PendingStep) {
        let mut pending = self.pending.lock().await;
        pending.push(step);
        metrics::gauge!("saga_outbox_pending").set(pending.len() as f64);
    }

    /// Returns a snapshot of the pending steps.
    pub async fn pending(&self) -> Vec<PendingStep> {
        self.pending.lock().await.clone()
    }

    /// Returns the number of pending steps.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
