//! Product stock record.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// Authoritative stock state for one product.
///
/// `quantity` is unsigned: negative stock is unrepresentable. Stores must
/// reject any delta that would underflow rather than clamp it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// The product identifier (SKU).
    pub product_id: ProductId,

    /// Human-readable product name.
    pub name: String,

    /// Current catalog price, snapshotted onto order lines at placement.
    pub unit_price: Money,

    /// Quantity on hand.
    pub quantity: u32,
}

impl ProductRecord {
    /// Creates a new product record.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }
}
