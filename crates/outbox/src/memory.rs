//! In-memory outbox store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::NotificationId;
use tokio::sync::RwLock;

use crate::entry::{DeliveryStatus, OutboxEntry};
use crate::error::{OutboxError, Result};
use crate::store::OutboxStore;

#[derive(Default)]
struct MemoryState {
    entries: HashMap<NotificationId, OutboxEntry>,
    // Enqueue order, so list_pending is stable even on equal timestamps.
    order: Vec<NotificationId>,
}

/// In-memory outbox store for tests and the default server wiring.
#[derive(Clone, Default)]
pub struct InMemoryOutboxStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of entries, any status.
    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn insert(&self, entry: OutboxEntry) -> Result<()> {
        let mut state = self.state.write().await;
        state.order.push(entry.id);
        state.entries.insert(entry.id, entry);
        Ok(())
    }

    async fn get(&self, id: NotificationId) -> Result<Option<OutboxEntry>> {
        Ok(self.state.read().await.entries.get(&id).cloned())
    }

    async fn claim(&self, id: NotificationId) -> Result<Option<OutboxEntry>> {
        let mut state = self.state.write().await;
        let entry = state
            .entries
            .get_mut(&id)
            .ok_or(OutboxError::NotFound(id))?;
        if entry.status != DeliveryStatus::Pending {
            return Ok(None);
        }
        entry.status = DeliveryStatus::Sending;
        Ok(Some(entry.clone()))
    }

    async fn claim_for_retry(&self, id: NotificationId) -> Result<OutboxEntry> {
        let mut state = self.state.write().await;
        let entry = state
            .entries
            .get_mut(&id)
            .ok_or(OutboxError::NotFound(id))?;
        entry.status = DeliveryStatus::Sending;
        Ok(entry.clone())
    }

    async fn record_outcome(
        &self,
        id: NotificationId,
        error: Option<String>,
    ) -> Result<OutboxEntry> {
        let mut state = self.state.write().await;
        let entry = state
            .entries
            .get_mut(&id)
            .ok_or(OutboxError::NotFound(id))?;

        entry.attempts += 1;
        match error {
            None => {
                entry.status = DeliveryStatus::Sent;
                entry.last_error = None;
                entry.sent_at = Some(Utc::now());
            }
            Some(reason) => {
                entry.status = DeliveryStatus::Failed;
                entry.last_error = Some(reason);
            }
        }
        Ok(entry.clone())
    }

    async fn list_pending(&self) -> Result<Vec<OutboxEntry>> {
        let state = self.state.read().await;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.entries.get(id))
            .filter(|e| e.status == DeliveryStatus::Pending)
            .cloned()
            .collect())
    }
}
