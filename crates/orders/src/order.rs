//! Order record and line items.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use stock::StockDebit;

use crate::status::OrderStatus;

/// One line of an order.
///
/// The unit price is a snapshot of the catalog price taken at placement;
/// later catalog changes never affect an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The ordered product.
    pub product_id: ProductId,

    /// Quantity ordered (>= 1).
    pub quantity: u32,

    /// Price per unit at placement time.
    pub unit_price: Money,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this line.
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order record.
///
/// Line items are immutable once the order exists; only the status changes,
/// and only along the graph in [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identity.
    pub id: OrderId,

    /// The customer who placed the order.
    pub owner: UserId,

    /// Current state-machine position.
    pub status: OrderStatus,

    /// Price-snapshotted line items.
    pub items: Vec<LineItem>,

    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order.
    pub fn new(owner: UserId, items: Vec<LineItem>) -> Self {
        Self {
            id: OrderId::new(),
            owner,
            status: OrderStatus::Pending,
            items,
            created_at: Utc::now(),
        }
    }

    /// Returns the order total.
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(LineItem::total_price).sum()
    }

    /// Returns the stock debits this order represents, for restore on cancel.
    pub fn stock_lines(&self) -> Vec<StockDebit> {
        self.items
            .iter()
            .map(|item| StockDebit::new(item.product_id.clone(), item.quantity))
            .collect()
    }
}
