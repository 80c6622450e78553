//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod stock;
