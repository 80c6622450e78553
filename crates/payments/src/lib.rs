//! Payment ledger: payment records, their state machine, offline receipts,
//! and the trigger point for the fulfillment saga.
//!
//! Payments finalize exactly once. The terminal-state check and the
//! transition are one atomic unit per payment, so replayed webhooks and
//! repeated verifications absorb into the first outcome without re-running
//! the saga's side effects.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod payment;
pub mod status;
pub mod store;

pub use error::PaymentError;
pub use ledger::{PaymentLedger, PaymentOutcome, SettlementOutcome};
pub use memory::InMemoryPaymentStore;
pub use payment::{OfflineReceipt, Payment, PaymentEvent, PaymentEventKind, ReceiptMethod};
pub use status::{Channel, PaymentStatus};
pub use store::{FinalizeResult, PaymentFilter, PaymentPage, PaymentStats, PaymentStore};
