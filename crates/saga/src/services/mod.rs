//! Downstream collaborator clients.
//!
//! Each step has a client trait with two implementations: a local one that
//! calls the in-process ledger (default single-process wiring and tests) and
//! an HTTP one for split deployments, carrying the shared internal token and
//! a short bounded timeout.

pub mod order_status;
pub mod stock_commit;

pub use order_status::{HttpOrderStatusClient, LocalOrderStatusClient, OrderStatusClient};
pub use stock_commit::{HttpStockCommitClient, LocalStockCommitClient, StockCommitClient};

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::Mutex;

use crate::coordinator::FulfillmentDriver;
use crate::report::{SagaReport, StepOutcome};

/// Test driver that records which orders triggered fulfillment.
#[derive(Clone, Default)]
pub struct RecordingDriver {
    calls: Arc<Mutex<Vec<OrderId>>>,
}

impl RecordingDriver {
    /// Creates a new recording driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the orders fulfillment was triggered for, in call order.
    pub async fn calls(&self) -> Vec<OrderId> {
        self.calls.lock().await.clone()
    }

    /// Returns the number of fulfillment triggers.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl FulfillmentDriver for RecordingDriver {
    async fn payment_succeeded(&self, order_id: OrderId) -> SagaReport {
        self.calls.lock().await.push(order_id);
        SagaReport {
            order_id,
            order_status: StepOutcome::Completed,
            stock_commit: StepOutcome::Completed,
        }
    }
}
