//! Saga coordinator.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use orders::OrderStatus;
use serde::Serialize;

use crate::outbox::{SagaOutbox, SagaStep};
use crate::report::{SagaReport, StepOutcome};
use crate::services::{OrderStatusClient, StockCommitClient};

/// Hook the payment ledger calls when a payment reaches `success`.
///
/// The ledger's own commit never depends on the hook's outcome; the returned
/// report only shapes the response to the external caller.
#[async_trait]
pub trait FulfillmentDriver: Send + Sync {
    /// Drives the downstream saga steps for the order.
    async fn payment_succeeded(&self, order_id: OrderId) -> SagaReport;
}

/// Counts from one pass over the retry outbox.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RetryStats {
    /// Steps taken from the outbox this pass.
    pub processed: usize,
    /// Steps that completed.
    pub completed: usize,
    /// Steps that failed again and went back into the outbox.
    pub failed: usize,
    /// Steps the collaborator rejected outright; dropped with a warning.
    pub rejected: usize,
}

/// Orchestrates the two downstream steps of the fulfillment saga.
///
/// Neither step holds any lock on the payment or order row while in flight;
/// the clients bound their own calls with short timeouts. A transiently
/// failing step is parked in the [`SagaOutbox`] and re-attempted by
/// [`retry_pending`](SagaCoordinator::retry_pending) (the server drains it on
/// an interval).
#[derive(Clone)]
pub struct SagaCoordinator {
    order_client: Arc<dyn OrderStatusClient>,
    stock_client: Arc<dyn StockCommitClient>,
    outbox: SagaOutbox,
}

impl SagaCoordinator {
    /// Creates a new coordinator over the given step clients.
    pub fn new(
        order_client: Arc<dyn OrderStatusClient>,
        stock_client: Arc<dyn StockCommitClient>,
    ) -> Self {
        Self {
            order_client,
            stock_client,
            outbox: SagaOutbox::new(),
        }
    }

    /// Returns the retry outbox.
    pub fn outbox(&self) -> &SagaOutbox {
        &self.outbox
    }

    async fn run_step(&self, order_id: OrderId, step: SagaStep) -> StepOutcome {
        let result = match step {
            SagaStep::SetOrderPaid => {
                self.order_client
                    .set_status(order_id, OrderStatus::Paid)
                    .await
            }
            SagaStep::CommitStock => self.stock_client.commit(order_id).await,
        };

        match result {
            Ok(()) => {
                metrics::counter!("saga_steps_completed", "step" => step.to_string()).increment(1);
                StepOutcome::Completed
            }
            Err(e) if e.is_retryable() => {
                metrics::counter!("saga_steps_failed", "step" => step.to_string()).increment(1);
                tracing::warn!(%order_id, %step, error = %e, "saga step failed, queued for retry");
                self.outbox.record_failure(order_id, step, &e.to_string()).await;
                StepOutcome::Retrying(e.to_string())
            }
            Err(e) => {
                metrics::counter!("saga_steps_rejected", "step" => step.to_string()).increment(1);
                tracing::warn!(%order_id, %step, error = %e, "saga step rejected");
                StepOutcome::Rejected(e.to_string())
            }
        }
    }

    /// Runs both downstream steps for a freshly successful payment.
    ///
    /// Step failures never propagate as errors: the payment is already
    /// committed and the inconsistency window is closed by retry instead.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, order_id: OrderId) -> SagaReport {
        metrics::counter!("saga_runs_total").increment(1);

        let order_status = self.run_step(order_id, SagaStep::SetOrderPaid).await;
        let stock_commit = self.run_step(order_id, SagaStep::CommitStock).await;

        SagaReport {
            order_id,
            order_status,
            stock_commit,
        }
    }

    /// Re-attempts every step currently parked in the outbox.
    #[tracing::instrument(skip(self))]
    pub async fn retry_pending(&self) -> RetryStats {
        let pending = self.outbox.take_all().await;
        let mut stats = RetryStats {
            processed: pending.len(),
            ..RetryStats::default()
        };

        for mut entry in pending {
            let result = match entry.step {
                SagaStep::SetOrderPaid => {
                    self.order_client
                        .set_status(entry.order_id, OrderStatus::Paid)
                        .await
                }
                SagaStep::CommitStock => self.stock_client.commit(entry.order_id).await,
            };

            match result {
                Ok(()) => {
                    tracing::info!(order_id = %entry.order_id, step = %entry.step, "saga step retried successfully");
                    stats.completed += 1;
                }
                Err(e) if e.is_retryable() => {
                    entry.attempts += 1;
                    entry.last_error = e.to_string();
                    self.outbox.put_back(entry).await;
                    stats.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(order_id = %entry.order_id, step = %entry.step, error = %e, "saga step rejected on retry, dropping");
                    stats.rejected += 1;
                }
            }
        }

        stats
    }
}

#[async_trait]
impl FulfillmentDriver for SagaCoordinator {
    async fn payment_succeeded(&self, order_id: OrderId) -> SagaReport {
        self.run(order_id).await
    }
}
