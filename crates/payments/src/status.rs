//! Payment state machine.

use serde::{Deserialize, Serialize};

/// The state of a payment attempt.
///
/// ```text
/// Initiated ────────────┬──► Success
/// AwaitingVerification ─┴──► Failed
/// ```
///
/// `Success` and `Failed` are terminal: once reached, no further transition
/// is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Online payment created, awaiting the provider webhook.
    Initiated,

    /// Offline payment submitted, awaiting manual verification.
    AwaitingVerification,

    /// Payment settled (terminal state).
    Success,

    /// Payment failed or was declined (terminal state).
    Failed,
}

impl PaymentStatus {
    /// Returns true if no further transition is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }

    /// Returns the status name as a wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::AwaitingVerification => "awaiting_verification",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the payment was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Provider-driven online payment.
    Online,
    /// Manually verified offline payment (bank transfer, cash).
    Offline,
}

impl Channel {
    /// Returns the channel name as a wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Online => "online",
            Channel::Offline => "offline",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
