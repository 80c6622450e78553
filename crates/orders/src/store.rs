//! Order store trait.

use async_trait::async_trait;
use common::{OrderId, UserId};

use crate::error::Result;
use crate::order::Order;
use crate::status::OrderStatus;

/// Storage contract for order records.
///
/// `transition` is the concurrency seam: the current-status check and the
/// status write must be one atomic unit, so racing callers (cancel vs. the
/// saga marking the order paid) apply exactly one effective transition.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order record.
    async fn insert(&self, order: Order) -> Result<()>;

    /// Fetches an order by id.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Atomically moves the order to `to` if its current status is one of
    /// `allowed_from`; otherwise fails with `InvalidTransition` carrying the
    /// actual current status. Returns the updated order.
    async fn transition(
        &self,
        order_id: OrderId,
        allowed_from: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<Order>;

    /// Lists orders owned by `owner`, oldest first.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Order>>;

    /// Lists every order, oldest first.
    async fn list_all(&self) -> Result<Vec<Order>>;
}
