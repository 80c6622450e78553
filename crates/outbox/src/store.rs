//! Outbox storage contract.

use async_trait::async_trait;
use common::NotificationId;

use crate::entry::OutboxEntry;
use crate::error::Result;

/// Storage for outbox entries.
///
/// `claim` is the concurrency seam: the `pending` check and the move to
/// `sending` are one atomic unit, so of any number of concurrent dispatchers
/// exactly one wins the entry.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Inserts a new entry.
    async fn insert(&self, entry: OutboxEntry) -> Result<()>;

    /// Fetches an entry by id.
    async fn get(&self, id: NotificationId) -> Result<Option<OutboxEntry>>;

    /// Atomically claims a `pending` entry for delivery, moving it to
    /// `sending`. Returns `None` when the entry is in any other status.
    async fn claim(&self, id: NotificationId) -> Result<Option<OutboxEntry>>;

    /// Forcibly claims an entry regardless of status (manual retry path).
    async fn claim_for_retry(&self, id: NotificationId) -> Result<OutboxEntry>;

    /// Records the outcome of a delivery attempt: increments `attempts`,
    /// sets `sent`/`failed`, and updates the error text and sent timestamp.
    async fn record_outcome(
        &self,
        id: NotificationId,
        error: Option<String>,
    ) -> Result<OutboxEntry>;

    /// Lists `pending` entries, oldest first. Claimed entries are invisible.
    async fn list_pending(&self) -> Result<Vec<OutboxEntry>>;
}
