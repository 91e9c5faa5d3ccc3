//! Event contracts and in-process fan-out.
//!
//! Inventory movements are facts: once a bucket mutation commits, a movement
//! record is emitted and distributed to whoever keeps the ledger.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
