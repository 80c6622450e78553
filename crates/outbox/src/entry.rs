//! Outbox entry types.

use chrono::{DateTime, Utc};
use common::NotificationId;
use serde::{Deserialize, Serialize};

/// Delivery channel for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery lifecycle of an entry.
///
/// `Sending` is the dispatch claim: it keeps the entry out of `list_pending`
/// while an attempt is in flight, so concurrent dispatchers cannot both pick
/// it up. An attempt always resolves the claim to `Sent` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Awaiting a delivery attempt.
    Pending,
    /// Claimed by a dispatcher, attempt in flight.
    Sending,
    /// Delivered.
    Sent,
    /// Last attempt failed; eligible for manual retry.
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sending => "sending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One outbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Entry identity.
    pub id: NotificationId,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// Address or phone number.
    pub recipient: String,
    /// Subject line (email only).
    pub subject: Option<String>,
    /// Message body.
    pub body: Option<String>,
    /// Caller-supplied structured payload, carried verbatim.
    pub payload: serde_json::Value,
    /// Lifecycle position.
    pub status: DeliveryStatus,
    /// Number of completed delivery attempts.
    pub attempts: u32,
    /// Error text from the most recent failed attempt.
    pub last_error: Option<String>,
    /// Enqueue timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the successful delivery, if any.
    pub sent_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    fn new(
        channel: NotificationChannel,
        recipient: String,
        subject: Option<String>,
        body: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            channel,
            recipient,
            subject,
            body,
            payload,
            status: DeliveryStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            sent_at: None,
        }
    }

    /// Creates a pending email entry.
    pub fn email(
        recipient: impl Into<String>,
        subject: Option<String>,
        body: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::new(
            NotificationChannel::Email,
            recipient.into(),
            subject,
            body,
            payload,
        )
    }

    /// Creates a pending SMS entry.
    pub fn sms(
        recipient: impl Into<String>,
        body: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::new(
            NotificationChannel::Sms,
            recipient.into(),
            None,
            Some(body.into()),
            payload,
        )
    }
}
