//! In-memory payment store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, PaymentId};
use tokio::sync::RwLock;

use crate::error::{PaymentError, Result};
use crate::payment::{OfflineReceipt, Payment, PaymentEvent};
use crate::status::PaymentStatus;
use crate::store::{FinalizeResult, PaymentFilter, PaymentPage, PaymentStats, PaymentStore};

#[derive(Default)]
struct MemoryState {
    payments: HashMap<PaymentId, Payment>,
    by_reference: HashMap<String, PaymentId>,
    receipts: HashMap<PaymentId, OfflineReceipt>,
}

/// In-memory payment store for tests and the default server wiring.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored payments.
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment, receipt: Option<OfflineReceipt>) -> Result<()> {
        let mut state = self.state.write().await;
        if state.by_reference.contains_key(&payment.reference) {
            return Err(PaymentError::DuplicateReference(payment.reference));
        }
        state.by_reference.insert(payment.reference.clone(), payment.id);
        if let Some(receipt) = receipt {
            state.receipts.insert(payment.id, receipt);
        }
        state.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.state.read().await.payments.get(&payment_id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>> {
        let state = self.state.read().await;
        Ok(state
            .by_reference
            .get(reference)
            .and_then(|id| state.payments.get(id))
            .cloned())
    }

    async fn finalize(
        &self,
        payment_id: PaymentId,
        to: PaymentStatus,
        event: PaymentEvent,
    ) -> Result<FinalizeResult> {
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .get_mut(&payment_id)
            .ok_or(PaymentError::NotFound(payment_id))?;

        // Terminal check and transition under one lock: replays absorb here.
        if payment.status.is_terminal() {
            return Ok(FinalizeResult::AlreadyFinal(payment.status));
        }

        payment.status = to;
        payment.events.push(event);
        payment.updated_at = Utc::now();
        Ok(FinalizeResult::Applied(payment.clone()))
    }

    async fn list_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let state = self.state.read().await;
        let mut result: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn list(&self, filter: &PaymentFilter, page: u32, per_page: u32) -> Result<PaymentPage> {
        let state = self.state.read().await;
        let mut matching: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| filter.channel.is_none_or(|c| p.channel == c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len();
        let page = page.max(1);
        // Widen before multiplying: the page number comes straight off the wire.
        let start = (page as usize - 1) * per_page as usize;
        let payments = matching
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Ok(PaymentPage {
            payments,
            total,
            page,
            per_page,
        })
    }

    async fn stats(&self) -> Result<PaymentStats> {
        let state = self.state.read().await;
        let today = Utc::now().date_naive();
        let mut stats = PaymentStats::default();

        for payment in state.payments.values() {
            match payment.status {
                PaymentStatus::Initiated => stats.initiated += 1,
                PaymentStatus::AwaitingVerification => stats.awaiting_verification += 1,
                PaymentStatus::Failed => stats.failed += 1,
                PaymentStatus::Success => {
                    stats.success += 1;
                    stats.revenue += payment.amount;
                    if payment.created_at.date_naive() == today {
                        stats.today_success += 1;
                        stats.today_revenue += payment.amount;
                    }
                }
            }
        }
        Ok(stats)
    }

    async fn receipt_for(&self, payment_id: PaymentId) -> Result<Option<OfflineReceipt>> {
        Ok(self.state.read().await.receipts.get(&payment_id).cloned())
    }
}
