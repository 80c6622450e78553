//! Per-run saga outcome report.

use common::OrderId;
use serde::Serialize;

/// Outcome of one downstream step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step completed.
    Completed,
    /// The step failed transiently and sits in the retry outbox.
    Retrying(String),
    /// The collaborator refused the step; retrying would not help.
    Rejected(String),
}

impl StepOutcome {
    /// Returns true if the step completed on this run.
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed)
    }
}

/// What one saga run achieved.
///
/// The payment success that triggered the run is already durable; this
/// report only describes the downstream steps. A non-completed
/// `order_status` is surfaced to the caller, a non-completed `stock_commit`
/// is best-effort and only logged — neither undoes the payment.
#[derive(Debug, Clone, Serialize)]
pub struct SagaReport {
    /// The order the saga ran for.
    pub order_id: OrderId,
    /// Outcome of the set-order-paid step.
    pub order_status: StepOutcome,
    /// Outcome of the stock-commit step.
    pub stock_commit: StepOutcome,
}

impl SagaReport {
    /// Returns true if the order was marked paid during this run.
    pub fn order_marked_paid(&self) -> bool {
        self.order_status.is_completed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_report() {
        let report = SagaReport {
            order_id: OrderId::new(),
            order_status: StepOutcome::Completed,
            stock_commit: StepOutcome::Completed,
        };
        assert!(report.order_marked_paid());
    }

    #[test]
    fn retrying_step_is_not_completed() {
        assert!(!StepOutcome::Retrying("timeout".into()).is_completed());
        assert!(!StepOutcome::Rejected("cancelled".into()).is_completed());
    }
}
