//! Shared types used across the fulfillment ledgers.
//!
//! Every ledger speaks in terms of the typed identifiers, the integer-cents
//! [`Money`] amount, and the explicit [`Actor`] authorization capability
//! defined here.

pub mod auth;
pub mod ids;
pub mod money;

pub use auth::Actor;
pub use ids::{NotificationId, OrderId, PaymentId, ProductId, UserId};
pub use money::Money;
