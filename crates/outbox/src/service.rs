//! Outbox service: enqueue, dispatch, retry.

use std::sync::Arc;

use common::NotificationId;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::entry::OutboxEntry;
use crate::error::{OutboxError, Result};
use crate::sender::NotificationSender;
use crate::store::OutboxStore;

/// Totals from one dispatch pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DispatchStats {
    /// Entries a delivery attempt ran for.
    pub processed: usize,
    /// Attempts that delivered.
    pub sent: usize,
    /// Attempts that failed.
    pub failed: usize,
}

/// The notification outbox service.
pub struct NotificationOutbox {
    store: Arc<dyn OutboxStore>,
    sender: Arc<dyn NotificationSender>,
}

impl NotificationOutbox {
    /// Creates an outbox over the given store and transport.
    pub fn new(store: Arc<dyn OutboxStore>, sender: Arc<dyn NotificationSender>) -> Self {
        Self { store, sender }
    }

    /// Enqueues a notification and immediately attempts delivery once.
    ///
    /// A failed first attempt is not an error: the entry stays in the outbox
    /// as `failed` with the reason recorded, ready for `retry`.
    #[instrument(skip_all, fields(channel = %entry.channel))]
    pub async fn enqueue(&self, entry: OutboxEntry) -> Result<OutboxEntry> {
        validate(&entry)?;
        let id = entry.id;
        self.store.insert(entry).await?;
        metrics::counter!("notifications_enqueued_total").increment(1);

        match self.store.claim(id).await? {
            Some(claimed) => self.attempt(claimed).await,
            // A background dispatcher got there first.
            None => self
                .store
                .get(id)
                .await?
                .ok_or(OutboxError::NotFound(id)),
        }
    }

    /// Fetches one entry.
    pub async fn get(&self, id: NotificationId) -> Result<OutboxEntry> {
        self.store.get(id).await?.ok_or(OutboxError::NotFound(id))
    }

    /// Lists entries still awaiting delivery, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<OutboxEntry>> {
        self.store.list_pending().await
    }

    /// Attempts delivery of every pending entry once.
    #[instrument(skip(self))]
    pub async fn dispatch_pending(&self) -> Result<DispatchStats> {
        let mut stats = DispatchStats::default();
        for entry in self.store.list_pending().await? {
            // Lost claims mean another dispatcher took the entry; skip.
            let Some(claimed) = self.store.claim(entry.id).await? else {
                continue;
            };
            stats.processed += 1;
            match self.attempt(claimed).await?.last_error {
                None => stats.sent += 1,
                Some(_) => stats.failed += 1,
            }
        }
        if stats.processed > 0 {
            info!(
                processed = stats.processed,
                sent = stats.sent,
                failed = stats.failed,
                "outbox dispatch pass"
            );
        }
        Ok(stats)
    }

    /// Re-attempts delivery of one entry regardless of its status.
    #[instrument(skip(self))]
    pub async fn retry(&self, id: NotificationId) -> Result<OutboxEntry> {
        let claimed = self.store.claim_for_retry(id).await?;
        self.attempt(claimed).await
    }

    /// Runs one delivery attempt against a claimed entry and records it.
    async fn attempt(&self, entry: OutboxEntry) -> Result<OutboxEntry> {
        let outcome = self.sender.deliver(&entry).await;
        let error = match outcome {
            Ok(()) => {
                metrics::counter!("notifications_sent_total", "channel" => entry.channel.as_str())
                    .increment(1);
                None
            }
            Err(err) => {
                metrics::counter!("notifications_failed_total", "channel" => entry.channel.as_str())
                    .increment(1);
                warn!(notification_id = %entry.id, error = %err, "notification delivery failed");
                Some(err.to_string())
            }
        };
        self.store.record_outcome(entry.id, error).await
    }
}

fn validate(entry: &OutboxEntry) -> Result<()> {
    if entry.recipient.trim().is_empty() {
        return Err(OutboxError::InvalidNotification("recipient is required"));
    }
    if entry.subject.is_none() && entry.body.is_none() {
        return Err(OutboxError::InvalidNotification(
            "a subject or body is required",
        ));
    }
    Ok(())
}
