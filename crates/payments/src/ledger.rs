//! Payment ledger: initiation, settlement, and the fulfillment hand-off.

use std::sync::Arc;

use common::{Money, OrderId, PaymentId};
use saga::{FulfillmentDriver, SagaReport};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::error::{PaymentError, Result};
use crate::payment::{OfflineReceipt, Payment, PaymentEvent, PaymentEventKind, ReceiptMethod};
use crate::status::PaymentStatus;
use crate::store::{FinalizeResult, PaymentFilter, PaymentPage, PaymentStats, PaymentStore};

/// Outcome reported by a provider webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Funds captured.
    Success,
    /// Declined or errored at the provider.
    Failed,
}

impl PaymentOutcome {
    fn terminal_status(self) -> PaymentStatus {
        match self {
            PaymentOutcome::Success => PaymentStatus::Success,
            PaymentOutcome::Failed => PaymentStatus::Failed,
        }
    }
}

/// Result of settling a payment (webhook delivery or manual verification).
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The payment after the settlement attempt.
    pub payment: Payment,
    /// True when the payment was already terminal and nothing changed.
    pub idempotent: bool,
    /// Fulfillment report, present only when this call applied a success.
    pub report: Option<SagaReport>,
}

/// The payment ledger. Settling a payment as successful triggers order
/// fulfillment through the driver; a settled payment stays settled even
/// when fulfillment is still catching up.
pub struct PaymentLedger {
    store: Arc<dyn PaymentStore>,
    driver: Arc<dyn FulfillmentDriver>,
}

impl PaymentLedger {
    /// Creates a ledger over the given store and fulfillment driver.
    pub fn new(store: Arc<dyn PaymentStore>, driver: Arc<dyn FulfillmentDriver>) -> Self {
        Self { store, driver }
    }

    /// Initiates an online payment for an order.
    #[instrument(skip(self))]
    pub async fn initiate(
        &self,
        order_id: OrderId,
        amount: Money,
        provider: &str,
    ) -> Result<Payment> {
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount(amount));
        }

        let payment = Payment::online(order_id, amount, provider);
        self.store.insert(payment.clone(), None).await?;

        metrics::counter!("payments_initiated_total").increment(1);
        info!(
            payment_id = %payment.id,
            reference = %payment.reference,
            "payment initiated"
        );
        Ok(payment)
    }

    /// Applies a provider webhook by external reference.
    ///
    /// At-least-once safe: redelivery of any outcome against a terminal
    /// payment is absorbed without side effects.
    #[instrument(skip(self))]
    pub async fn webhook(
        &self,
        reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<SettlementOutcome> {
        let payment = self
            .store
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| PaymentError::UnknownReference(reference.to_string()))?;

        let event = PaymentEvent::new(
            PaymentEventKind::Webhook,
            json!({ "outcome": outcome, "reference": reference }),
        );
        self.settle(payment.id, outcome, event).await
    }

    /// Records an offline payment awaiting manual verification.
    #[instrument(skip(self, receipt_reference, attachment_url))]
    pub async fn offline(
        &self,
        order_id: OrderId,
        amount: Money,
        method: ReceiptMethod,
        receipt_reference: &str,
        attachment_url: Option<String>,
    ) -> Result<Payment> {
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount(amount));
        }

        let payment = Payment::offline(order_id, amount, method, receipt_reference);
        let receipt = OfflineReceipt {
            payment_id: payment.id,
            method,
            reference: receipt_reference.to_string(),
            amount,
            attachment_url,
            created_at: payment.created_at,
        };
        self.store.insert(payment.clone(), Some(receipt)).await?;

        metrics::counter!("payments_offline_submitted_total").increment(1);
        info!(
            payment_id = %payment.id,
            reference = %payment.reference,
            "offline payment submitted"
        );
        Ok(payment)
    }

    /// Applies a manual verification decision to a payment.
    ///
    /// Idempotent on terminal payments, same as the webhook path.
    #[instrument(skip(self))]
    pub async fn verify(&self, payment_id: PaymentId, approved: bool) -> Result<SettlementOutcome> {
        // Fail fast on unknown ids before building the event.
        self.store
            .get(payment_id)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))?;

        let outcome = if approved {
            PaymentOutcome::Success
        } else {
            PaymentOutcome::Failed
        };
        let event = PaymentEvent::new(PaymentEventKind::Verify, json!({ "approved": approved }));
        self.settle(payment_id, outcome, event).await
    }

    /// Fetches a payment by id.
    pub async fn get(&self, payment_id: PaymentId) -> Result<Payment> {
        self.store
            .get(payment_id)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))
    }

    /// Lists a single order's payments, newest first.
    pub async fn list_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        self.store.list_by_order(order_id).await
    }

    /// Lists payments matching `filter`, newest first, paginated.
    pub async fn list(
        &self,
        filter: &PaymentFilter,
        page: u32,
        per_page: u32,
    ) -> Result<PaymentPage> {
        self.store.list(filter, page, per_page).await
    }

    /// Computes aggregate payment statistics.
    pub async fn stats(&self) -> Result<PaymentStats> {
        self.store.stats().await
    }

    /// Fetches the receipt attached to an offline payment.
    pub async fn receipt_for(&self, payment_id: PaymentId) -> Result<Option<OfflineReceipt>> {
        self.store.receipt_for(payment_id).await
    }

    /// Shared settlement path for webhooks and manual verification.
    ///
    /// The store decides the race: exactly one caller gets `Applied`, and
    /// only that caller starts fulfillment. Fulfillment never fails the
    /// settlement; the coordinator parks anything that needs a retry.
    async fn settle(
        &self,
        payment_id: PaymentId,
        outcome: PaymentOutcome,
        event: PaymentEvent,
    ) -> Result<SettlementOutcome> {
        let to = outcome.terminal_status();

        match self.store.finalize(payment_id, to, event).await? {
            FinalizeResult::Applied(payment) => {
                metrics::counter!("payments_settled_total", "outcome" => to.as_str())
                    .increment(1);
                info!(payment_id = %payment.id, status = %payment.status, "payment settled");

                let report = if outcome == PaymentOutcome::Success {
                    Some(self.driver.payment_succeeded(payment.order_id).await)
                } else {
                    None
                };
                Ok(SettlementOutcome {
                    payment,
                    idempotent: false,
                    report,
                })
            }
            FinalizeResult::AlreadyFinal(status) => {
                metrics::counter!("payments_settlement_replays_total").increment(1);
                warn!(%payment_id, %status, "settlement replay absorbed");
                let payment = self.get(payment_id).await?;
                Ok(SettlementOutcome {
                    payment,
                    idempotent: true,
                    report: None,
                })
            }
        }
    }
}
