//! Movement ledger contract.
//!
//! Every committed bucket mutation produces a [`MovementRecord`]. Storage and
//! querying of the ledger live elsewhere; the engine only hands records to an
//! [`AuditCollaborator`] and never lets a ledger failure undo or fail a
//! mutation that already committed.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use toolrent_core::{ActorId, BucketId, DomainError, DomainResult};
use toolrent_events::{Event, EventBus};

use crate::state::ToolState;

/// What happened to the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovementKind {
    /// Units registered into stock.
    Intake,
    /// One unit arrived from a state move.
    StateChange { to: ToolState },
    /// Amount or reposition value overwritten.
    Update,
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MovementKind::Intake => f.write_str("Intake"),
            MovementKind::StateChange { to } => write!(f, "State change: {to}"),
            MovementKind::Update => f.write_str("Tool update"),
        }
    }
}

/// One ledger line. Name and category are snapshots taken at mutation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub tool_id: BucketId,
    pub name_snapshot: String,
    pub category_snapshot: String,
    pub actor: ActorId,
    pub kind: MovementKind,
    pub date: NaiveDate,
    pub stock: i64,
    pub recorded_at: DateTime<Utc>,
}

impl Event for MovementRecord {
    fn event_type(&self) -> &'static str {
        match self.kind {
            MovementKind::Intake => "inventory.movement.intake",
            MovementKind::StateChange { .. } => "inventory.movement.state_change",
            MovementKind::Update => "inventory.movement.update",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Receiver of movement records.
pub trait AuditCollaborator: Send + Sync {
    fn record_movement(&self, movement: MovementRecord) -> DomainResult<()>;
}

impl<A> AuditCollaborator for Arc<A>
where
    A: AuditCollaborator + ?Sized,
{
    fn record_movement(&self, movement: MovementRecord) -> DomainResult<()> {
        (**self).record_movement(movement)
    }
}

/// Keeps every record in memory (tests/dev).
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    records: RwLock<Vec<MovementRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MovementRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn records_for(&self, tool_id: BucketId) -> Vec<MovementRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.tool_id == tool_id)
            .collect()
    }
}

impl AuditCollaborator for InMemoryAuditLog {
    fn record_movement(&self, movement: MovementRecord) -> DomainResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::unavailable("audit log lock poisoned"))?;
        records.push(movement);
        Ok(())
    }
}

/// Fans records out on an event bus (the ledger service subscribes).
#[derive(Debug)]
pub struct PublishingAuditLog<B> {
    bus: B,
}

impl<B> PublishingAuditLog<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B> AuditCollaborator for PublishingAuditLog<B>
where
    B: EventBus<MovementRecord>,
{
    fn record_movement(&self, movement: MovementRecord) -> DomainResult<()> {
        self.bus
            .publish(movement)
            .map_err(|e| DomainError::unavailable(format!("movement publish failed: {e:?}")))
    }
}
