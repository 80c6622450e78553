//! Order ledger: order records, their state machine, and the stock
//! debit/restore protocol.
//!
//! Placement debits stock immediately — there is no two-phase reservation.
//! Placement and payment are deliberately decoupled; cancellation is the
//! compensating action that restores stock.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod order;
pub mod status;
pub mod store;

pub use error::OrderError;
pub use ledger::{OrderLedger, PlaceLine};
pub use memory::InMemoryOrderStore;
pub use order::{LineItem, Order};
pub use status::OrderStatus;
pub use store::OrderStore;
