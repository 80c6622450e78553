//! Notification outbox.
//!
//! Outbound notifications are written to the outbox first and delivered from
//! there. Every delivery attempt runs against a claimed entry (`pending` ->
//! `sending`) so two dispatchers never send the same notification twice, and
//! every attempt leaves a consistent record: attempts incremented by one,
//! status, last error, and sent timestamp all updated together. Entries are
//! never deleted.

pub mod entry;
pub mod error;
pub mod memory;
pub mod sender;
pub mod service;
pub mod store;

pub use entry::{DeliveryStatus, NotificationChannel, OutboxEntry};
pub use error::OutboxError;
pub use memory::InMemoryOutboxStore;
pub use sender::{NotificationSender, SendError, SimulatedSender};
pub use service::{DispatchStats, NotificationOutbox};
pub use store::OutboxStore;
