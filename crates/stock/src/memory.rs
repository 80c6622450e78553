//! In-memory stock store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId};
use tokio::sync::RwLock;

use crate::error::{Result, StockError};
use crate::record::ProductRecord;
use crate::store::{DebitedLine, StockDebit, StockStore};

#[derive(Debug, Default)]
struct MemoryState {
    products: HashMap<ProductId, ProductRecord>,
    commits: HashSet<OrderId>,
}

/// In-memory stock store.
///
/// All mutations run under a single write lock, so the conditional check and
/// the update form one critical section. Used by tests and the default
/// single-process server wiring.
#[derive(Clone, Default)]
pub struct InMemoryStockStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStockStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed orders.
    pub async fn commit_count(&self) -> usize {
        self.state.read().await.commits.len()
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn insert_product(&self, record: ProductRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&record.product_id) {
            return Err(StockError::ProductExists(record.product_id));
        }
        state.products.insert(record.product_id.clone(), record);
        Ok(())
    }

    async fn get(&self, product_id: &ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.state.read().await.products.get(product_id).cloned())
    }

    async fn adjust(&self, product_id: &ProductId, delta: i64) -> Result<u32> {
        let mut state = self.state.write().await;
        let record = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| StockError::ProductNotFound(product_id.clone()))?;

        let next = record.quantity as i64 + delta;
        if next < 0 {
            return Err(StockError::NegativeStock {
                product_id: product_id.clone(),
                available: record.quantity,
                delta,
            });
        }
        record.quantity = next as u32;
        Ok(record.quantity)
    }

    async fn debit_all(&self, lines: &[StockDebit]) -> Result<Vec<DebitedLine>> {
        let mut state = self.state.write().await;
        let mut applied: Vec<DebitedLine> = Vec::with_capacity(lines.len());

        // Apply sequentially inside the lock; on the first failure, undo
        // everything already applied. Sequential application (rather than a
        // verify-then-apply pass) keeps a product repeated across lines
        // honest about the combined quantity.
        for line in lines {
            let record = match state.products.get_mut(&line.product_id) {
                Some(record) => record,
                None => {
                    let err = StockError::ProductNotFound(line.product_id.clone());
                    rollback(&mut state, &applied);
                    return Err(err);
                }
            };

            if record.quantity < line.quantity {
                let err = StockError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available: record.quantity,
                    requested: line.quantity,
                };
                rollback(&mut state, &applied);
                return Err(err);
            }

            record.quantity -= line.quantity;
            applied.push(DebitedLine {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price: record.unit_price,
            });
        }

        metrics::counter!("stock_debits_total").increment(applied.len() as u64);
        Ok(applied)
    }

    async fn restore_all(&self, lines: &[StockDebit]) -> Result<()> {
        let mut state = self.state.write().await;
        for line in lines {
            match state.products.get_mut(&line.product_id) {
                Some(record) => record.quantity += line.quantity,
                None => {
                    tracing::warn!(product_id = %line.product_id, "restore skipped, product gone");
                }
            }
        }
        metrics::counter!("stock_restores_total").increment(lines.len() as u64);
        Ok(())
    }

    async fn commit_order(&self, order_id: OrderId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.commits.insert(order_id))
    }

    async fn is_committed(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.state.read().await.commits.contains(&order_id))
    }
}

fn rollback(state: &mut MemoryState, applied: &[DebitedLine]) {
    for line in applied {
        if let Some(record) = state.products.get_mut(&line.product_id) {
            record.quantity += line.quantity;
        }
    }
}
