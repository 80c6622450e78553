//! Stock ledger: authoritative quantity-on-hand per product.
//!
//! The central safety invariant lives here: a product's quantity never goes
//! negative. Every mutation is a single atomic conditional update — the check
//! and the write happen in one step, never as a separate read-then-write —
//! so concurrent placements against the same product cannot oversell.
//!
//! Two store implementations are provided:
//! - [`InMemoryStockStore`] — a write-lock critical section, used by tests
//!   and the default single-process wiring.
//! - [`PostgresStockStore`] — conditional `UPDATE` statements inside one
//!   transaction per logical operation.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::StockError;
pub use memory::InMemoryStockStore;
pub use postgres::PostgresStockStore;
pub use record::ProductRecord;
pub use store::{DebitedLine, StockDebit, StockStore};
