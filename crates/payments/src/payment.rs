//! Payment record, audit events, and offline receipts.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::status::{Channel, PaymentStatus};

/// Kind of an audit-trail event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    /// Online payment created.
    Initiate,
    /// Provider webhook received.
    Webhook,
    /// Offline payment submitted.
    OfflineSubmit,
    /// Manual verification decision.
    Verify,
}

/// One entry in a payment's append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// What happened.
    pub kind: PaymentEventKind,
    /// When it happened.
    pub at: DateTime<Utc>,
    /// Event-specific attributes.
    pub attributes: serde_json::Value,
}

impl PaymentEvent {
    /// Creates an event stamped with the current time.
    pub fn new(kind: PaymentEventKind, attributes: serde_json::Value) -> Self {
        Self {
            kind,
            at: Utc::now(),
            attributes,
        }
    }
}

/// How an offline payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptMethod {
    /// Bank transfer with an external reference.
    BankTransfer,
    /// Cash handed over in person.
    Cash,
}

/// Receipt attached to an offline payment. Owned by exactly one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineReceipt {
    /// The owning payment.
    pub payment_id: PaymentId,
    /// How the money was handed over.
    pub method: ReceiptMethod,
    /// Customer-supplied reference (transfer number, till receipt, ...).
    pub reference: String,
    /// Amount on the receipt.
    pub amount: Money,
    /// Optional attachment locator (scan or photo).
    pub attachment_url: Option<String>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

/// A payment attempt against one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identity.
    pub id: PaymentId,

    /// The order being paid for. An order may accumulate several attempts;
    /// at most one is expected to reach `success`.
    pub order_id: OrderId,

    /// Amount (> 0).
    pub amount: Money,

    /// Provider tag ("stripe", "mock", "offline", ...).
    pub provider: String,

    /// Online or offline.
    pub channel: Channel,

    /// State-machine position.
    pub status: PaymentStatus,

    /// Globally unique external reference, quoted in provider webhooks.
    pub reference: String,

    /// Append-only audit trail.
    pub events: Vec<PaymentEvent>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates an online payment in `initiated` with a fresh reference.
    pub fn online(order_id: OrderId, amount: Money, provider: impl Into<String>) -> Self {
        let provider = provider.into();
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            order_id,
            amount,
            channel: Channel::Online,
            status: PaymentStatus::Initiated,
            reference: Self::new_reference("PMT"),
            events: vec![PaymentEvent::new(
                PaymentEventKind::Initiate,
                json!({ "provider": provider }),
            )],
            provider,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an offline payment in `awaiting_verification`.
    pub fn offline(order_id: OrderId, amount: Money, method: ReceiptMethod, reference: &str) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            order_id,
            amount,
            provider: "offline".to_string(),
            channel: Channel::Offline,
            status: PaymentStatus::AwaitingVerification,
            reference: Self::new_reference("OFF"),
            events: vec![PaymentEvent::new(
                PaymentEventKind::OfflineSubmit,
                json!({ "method": method, "reference": reference }),
            )],
            created_at: now,
            updated_at: now,
        }
    }

    fn new_reference(prefix: &str) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{prefix}_{}", &hex[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_payment_shape() {
        let payment = Payment::online(OrderId::new(), Money::from_cents(5000), "mock");
        assert_eq!(payment.status, PaymentStatus::Initiated);
        assert_eq!(payment.channel, Channel::Online);
        assert!(payment.reference.starts_with("PMT_"));
        assert_eq!(payment.reference.len(), 20);
        assert_eq!(payment.events.len(), 1);
        assert_eq!(payment.events[0].kind, PaymentEventKind::Initiate);
    }

    #[test]
    fn offline_payment_shape() {
        let payment = Payment::offline(
            OrderId::new(),
            Money::from_cents(5000),
            ReceiptMethod::BankTransfer,
            "TRX-42",
        );
        assert_eq!(payment.status, PaymentStatus::AwaitingVerification);
        assert_eq!(payment.channel, Channel::Offline);
        assert_eq!(payment.provider, "offline");
        assert!(payment.reference.starts_with("OFF_"));
        assert_eq!(payment.events[0].kind, PaymentEventKind::OfflineSubmit);
    }

    #[test]
    fn references_are_unique() {
        let order_id = OrderId::new();
        let a = Payment::online(order_id, Money::from_cents(100), "mock");
        let b = Payment::online(order_id, Money::from_cents(100), "mock");
        assert_ne!(a.reference, b.reference);
    }

    #[test]
    fn payment_serialization_roundtrip() {
        let payment = Payment::online(OrderId::new(), Money::from_cents(100), "mock");
        let json = serde_json::to_string(&payment).unwrap();
        let deserialized: Payment = serde_json::from_str(&json).unwrap();
        assert_eq!(payment, deserialized);
    }
}
