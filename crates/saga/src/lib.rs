//! Fulfillment saga: the protocol that closes the gap between a successful
//! payment and a consistent order/stock state.
//!
//! On payment success the coordinator performs two downstream steps against
//! independent collaborators:
//! 1. Set the owning order's status to `paid`.
//! 2. Commit (finalize) the stock already debited at placement.
//!
//! The payment's own transition to `success` is committed before either step
//! runs and is never rolled back by their failure. The saga is therefore
//! at-least-once: both steps are idempotent, failed steps land in a retry
//! outbox, and the transient inconsistency window is closed by retry rather
//! than rollback.

pub mod coordinator;
pub mod error;
pub mod outbox;
pub mod report;
pub mod services;

pub use coordinator::{FulfillmentDriver, RetryStats, SagaCoordinator};
pub use error::SagaError;
pub use outbox::{PendingStep, SagaOutbox, SagaStep};
pub use report::{SagaReport, StepOutcome};
pub use services::{
    HttpOrderStatusClient, HttpStockCommitClient, LocalOrderStatusClient, LocalStockCommitClient,
    OrderStatusClient, RecordingDriver, StockCommitClient,
};
