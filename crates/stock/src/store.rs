//! Stock store trait and operation types.

use async_trait::async_trait;
use common::{Money, OrderId, ProductId};

use crate::error::Result;
use crate::record::ProductRecord;

/// A requested debit (or restore) of one product line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDebit {
    /// The product to debit.
    pub product_id: ProductId,
    /// Quantity to debit.
    pub quantity: u32,
}

impl StockDebit {
    /// Creates a new debit line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// One successfully debited line, carrying the price snapshot taken at the
/// moment of the debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitedLine {
    /// The debited product.
    pub product_id: ProductId,
    /// Quantity debited.
    pub quantity: u32,
    /// Catalog price at debit time.
    pub unit_price: Money,
}

/// Storage contract for the stock ledger.
///
/// Implementations must make every mutation atomic with respect to
/// concurrent mutations of the same product: the availability check and the
/// write are one unit, and a multi-line debit is all-or-nothing.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Inserts a new product record.
    async fn insert_product(&self, record: ProductRecord) -> Result<()>;

    /// Fetches a product record.
    async fn get(&self, product_id: &ProductId) -> Result<Option<ProductRecord>>;

    /// Applies a signed delta to a product's quantity.
    ///
    /// Rejects with [`StockError::NegativeStock`] if the result would be
    /// negative. Returns the new quantity.
    ///
    /// [`StockError::NegativeStock`]: crate::StockError::NegativeStock
    async fn adjust(&self, product_id: &ProductId, delta: i64) -> Result<u32>;

    /// Debits every line or none of them.
    ///
    /// Fails with [`StockError::InsufficientStock`] naming the first product
    /// that cannot cover its requested quantity; no partial debit is visible
    /// afterwards. On success returns the debited lines with their price
    /// snapshots.
    ///
    /// [`StockError::InsufficientStock`]: crate::StockError::InsufficientStock
    async fn debit_all(&self, lines: &[StockDebit]) -> Result<Vec<DebitedLine>>;

    /// Restores previously debited lines (the cancellation compensating
    /// action). Lines for products that no longer exist are skipped.
    async fn restore_all(&self, lines: &[StockDebit]) -> Result<()>;

    /// Records that the stock changes for an order are finalized.
    ///
    /// Idempotent: returns `true` the first time, `false` on replays.
    async fn commit_order(&self, order_id: OrderId) -> Result<bool>;

    /// Returns true if stock for the order has been committed.
    async fn is_committed(&self, order_id: OrderId) -> Result<bool>;
}
