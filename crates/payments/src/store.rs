//! Payment store trait and read-side types.

use async_trait::async_trait;
use common::{Money, OrderId, PaymentId};
use serde::Serialize;

use crate::error::Result;
use crate::payment::{OfflineReceipt, Payment, PaymentEvent};
use crate::status::{Channel, PaymentStatus};

/// Result of an atomic finalization attempt.
#[derive(Debug, Clone)]
pub enum FinalizeResult {
    /// The transition was applied; carries the updated payment.
    Applied(Payment),
    /// The payment was already terminal; carries the existing status.
    AlreadyFinal(PaymentStatus),
}

/// Filters for the paginated payment listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentFilter {
    /// Restrict to one status.
    pub status: Option<PaymentStatus>,
    /// Restrict to one channel.
    pub channel: Option<Channel>,
}

/// One page of payments, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentPage {
    /// The payments on this page.
    pub payments: Vec<Payment>,
    /// Total matching payments across all pages.
    pub total: usize,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
}

/// Aggregate payment statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentStats {
    /// Payments currently in `initiated`.
    pub initiated: u64,
    /// Payments currently in `awaiting_verification`.
    pub awaiting_verification: u64,
    /// Payments that reached `success`.
    pub success: u64,
    /// Payments that reached `failed`.
    pub failed: u64,
    /// Sum of all successful amounts.
    pub revenue: Money,
    /// Successful payments created today (UTC).
    pub today_success: u64,
    /// Revenue from today's successful payments.
    pub today_revenue: Money,
}

/// Storage contract for the payment ledger.
///
/// `finalize` is the concurrency seam: the terminal-state check and the
/// transition must be one atomic unit per payment, so two concurrent
/// deliveries of the same outcome apply exactly one effective transition.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a payment, with its receipt for the offline channel.
    async fn insert(&self, payment: Payment, receipt: Option<OfflineReceipt>) -> Result<()>;

    /// Fetches a payment by id.
    async fn get(&self, payment_id: PaymentId) -> Result<Option<Payment>>;

    /// Looks a payment up by its unique external reference.
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>>;

    /// Atomically finalizes the payment to `to` (`success` or `failed`),
    /// appending `event` to the audit log. If the payment is already
    /// terminal, nothing changes and the existing status is returned.
    async fn finalize(
        &self,
        payment_id: PaymentId,
        to: PaymentStatus,
        event: PaymentEvent,
    ) -> Result<FinalizeResult>;

    /// Lists payments for an order, newest first.
    async fn list_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>>;

    /// Lists payments matching `filter`, newest first, paginated.
    async fn list(&self, filter: &PaymentFilter, page: u32, per_page: u32) -> Result<PaymentPage>;

    /// Computes aggregate statistics.
    async fn stats(&self) -> Result<PaymentStats>;

    /// Fetches the receipt attached to an offline payment.
    async fn receipt_for(&self, payment_id: PaymentId) -> Result<Option<OfflineReceipt>>;
}
