//! Tool inventory as aggregated stock buckets.
//!
//! Stock is not tracked per physical unit: one bucket row holds the count of
//! interchangeable units of an item type (name + category) in one state.
//! Registration merges into an existing bucket; a state move takes one unit
//! out of its bucket and puts it into the sibling bucket for the target
//! state, creating that bucket on first use.

pub mod audit;
pub mod bucket;
pub mod engine;
pub mod lock;
pub mod state;
pub mod store;

pub use audit::{AuditCollaborator, InMemoryAuditLog, MovementKind, MovementRecord, PublishingAuditLog};
pub use bucket::{Bucket, BucketKey, ItemType};
pub use engine::{EditAttributes, InventoryBucketEngine, RegisterStock};
pub use lock::{KeyGuard, KeyLocks};
pub use state::ToolState;
pub use store::{BucketStore, InMemoryBucketStore};
