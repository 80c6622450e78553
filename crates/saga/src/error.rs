//! Saga error types.

use thiserror::Error;

/// Errors surfaced by a downstream saga step.
#[derive(Debug, Clone, Error)]
pub enum SagaError {
    /// The collaborator could not be reached, timed out, or failed
    /// transiently. Retryable.
    #[error("Downstream unavailable: {0}")]
    Downstream(String),

    /// The collaborator understood the call and refused it (for example the
    /// order was cancelled before the payment settled). Not retryable.
    #[error("Downstream rejected the call: {0}")]
    Rejected(String),
}

impl SagaError {
    /// Returns true if retrying the step could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SagaError::Downstream(_))
    }
}

/// Convenience type alias for saga step results.
pub type Result<T> = std::result::Result<T, SagaError>;
