//! Order ledger operations.

use std::sync::Arc;

use common::{Actor, OrderId, ProductId};
use stock::{StockDebit, StockStore};

use crate::error::{OrderError, Result};
use crate::order::{LineItem, Order};
use crate::status::OrderStatus;
use crate::store::OrderStore;

/// One requested order line at placement time.
#[derive(Debug, Clone)]
pub struct PlaceLine {
    /// The product to order.
    pub product_id: ProductId,
    /// Quantity requested (>= 1).
    pub quantity: u32,
}

impl PlaceLine {
    /// Creates a new placement line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// The order ledger.
///
/// Owns order records and drives the state machine, calling the stock ledger
/// to debit on placement and restore on cancellation.
#[derive(Clone)]
pub struct OrderLedger {
    orders: Arc<dyn OrderStore>,
    stock: Arc<dyn StockStore>,
}

impl OrderLedger {
    /// Creates a new order ledger over the given stores.
    pub fn new(orders: Arc<dyn OrderStore>, stock: Arc<dyn StockStore>) -> Self {
        Self { orders, stock }
    }

    /// Places an order for the acting customer.
    ///
    /// Verifies availability and debits stock for every line atomically; if
    /// any line cannot be covered the whole placement fails and no debit is
    /// visible. Line prices are snapshotted from the catalog at this moment.
    #[tracing::instrument(skip(self, actor, lines))]
    pub async fn place(&self, actor: &Actor, lines: Vec<PlaceLine>) -> Result<Order> {
        let owner = actor.user_id().ok_or(OrderError::Forbidden)?;

        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                });
            }
        }

        let debits: Vec<StockDebit> = lines
            .iter()
            .map(|line| StockDebit::new(line.product_id.clone(), line.quantity))
            .collect();

        // Debit first: the stock store makes this all-or-nothing, and the
        // price snapshot comes back from the same atomic step.
        let debited = self.stock.debit_all(&debits).await?;

        let items: Vec<LineItem> = debited
            .into_iter()
            .map(|line| LineItem::new(line.product_id, line.quantity, line.unit_price))
            .collect();

        let order = Order::new(owner, items);
        self.orders.insert(order.clone()).await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total_amount(), "order placed");
        Ok(order)
    }

    /// Cancels an order, restoring stock for every line item.
    ///
    /// Permitted only for the owner or an administrative caller, and only
    /// while the order is `pending` or `paid`. The status check and the
    /// transition are one atomic step, so a racing cancel or payment settles
    /// to exactly one winner and stock is restored exactly once.
    #[tracing::instrument(skip(self, actor))]
    pub async fn cancel(&self, actor: &Actor, order_id: OrderId) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if !actor.can_act_for(order.owner) {
            return Err(OrderError::Forbidden);
        }

        let cancelled = self
            .orders
            .transition(
                order_id,
                &[OrderStatus::Pending, OrderStatus::Paid],
                OrderStatus::Cancelled,
            )
            .await?;

        self.stock.restore_all(&cancelled.stock_lines()).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order_id, "order cancelled, stock restored");
        Ok(cancelled)
    }

    /// Administrative status update.
    ///
    /// Accepts any enumerated status but enforces the state graph: the order
    /// must currently be in a status that may legally transition to
    /// `new_status`. The saga's `pending → paid` step goes through here with
    /// the internal actor.
    #[tracing::instrument(skip(self, actor))]
    pub async fn set_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order> {
        if !matches!(actor, Actor::Admin | Actor::Internal) {
            return Err(OrderError::Forbidden);
        }

        let allowed_from = OrderStatus::sources_of(new_status);
        let updated = self
            .orders
            .transition(order_id, &allowed_from, new_status)
            .await?;

        tracing::info!(order_id = %order_id, status = %new_status, "order status updated");
        Ok(updated)
    }

    /// Fetches one order; customers see only their own.
    pub async fn get(&self, actor: &Actor, order_id: OrderId) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if !actor.can_act_for(order.owner) {
            return Err(OrderError::Forbidden);
        }
        Ok(order)
    }

    /// Lists the acting customer's own orders.
    pub async fn list_own(&self, actor: &Actor) -> Result<Vec<Order>> {
        let owner = actor.user_id().ok_or(OrderError::Forbidden)?;
        self.orders.list_by_owner(owner).await
    }

    /// Lists every order (admin only).
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Order>> {
        if !actor.is_admin() {
            return Err(OrderError::Forbidden);
        }
        self.orders.list_all().await
    }
}
