//! Bucket engine: registration, state moves, attribute edits and lookups.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use toolrent_core::{ActorId, BucketId, Clock, DomainError, DomainResult, SystemClock};

use crate::audit::{AuditCollaborator, MovementKind, MovementRecord};
use crate::bucket::{Bucket, ItemType};
use crate::lock::KeyLocks;
use crate::state::ToolState;
use crate::store::BucketStore;

/// Command: register units of an item type in a given state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStock {
    pub name: String,
    pub category: String,
    pub state: ToolState,
    pub amount: i64,
    pub reposition_value: i64,
}

/// Command: overwrite bucket attributes in place (no state move).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditAttributes {
    pub amount: Option<i64>,
    pub reposition_value: Option<i64>,
}

/// Owner of all stock buckets.
///
/// Mutations hold the per-key lock of every bucket they touch for the whole
/// read-modify-write, so concurrent callers on the same (name, category,
/// state) triple never interleave. Reads take no key locks and may observe a
/// state that a concurrent writer is about to replace.
pub struct InventoryBucketEngine<S> {
    store: S,
    locks: KeyLocks,
    audit: Arc<dyn AuditCollaborator>,
    clock: Arc<dyn Clock>,
}

impl<S> InventoryBucketEngine<S> {
    pub fn new(store: S, audit: Arc<dyn AuditCollaborator>) -> Self {
        Self {
            store,
            locks: KeyLocks::new(),
            audit,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the calendar used to date movement records.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: BucketStore> InventoryBucketEngine<S> {
    /// Add `amount` units to the (name, category, state) bucket, creating it
    /// if needed. The reposition value is overwritten (last write wins).
    pub fn register_stock(&self, cmd: RegisterStock, actor: &ActorId) -> DomainResult<Bucket> {
        let item = ItemType::parse(&cmd.name, &cmd.category)?;
        if cmd.reposition_value <= 0 {
            return Err(DomainError::validation("reposition value must be > 0"));
        }
        if cmd.amount <= 0 {
            return Err(DomainError::validation("amount must be > 0"));
        }

        let key = item.key(cmd.state);
        let saved = {
            let _guard = self.locks.lock(&[&key])?;
            let bucket = match self.store.find_by_key(&key)? {
                Some(mut existing) => {
                    existing.add_units(cmd.amount);
                    existing.set_reposition_value(cmd.reposition_value);
                    existing
                }
                None => Bucket::new(&item, cmd.state, cmd.amount, cmd.reposition_value),
            };
            self.store.upsert(bucket.clone())?;
            bucket
        };

        tracing::info!(
            bucket_id = %saved.id_typed(),
            name = saved.name(),
            category = saved.category(),
            state = %saved.state(),
            added = cmd.amount,
            amount = saved.amount(),
            "stock registered"
        );
        self.record(&saved, actor, MovementKind::Intake, cmd.amount);
        Ok(saved)
    }

    /// Move one unit from `source_id` into the sibling bucket for `target`.
    ///
    /// Returns the destination bucket. The destination is created at amount 0
    /// (inheriting the source's reposition value) when it does not exist yet.
    pub fn move_unit(
        &self,
        source_id: BucketId,
        target: ToolState,
        actor: &ActorId,
    ) -> DomainResult<Bucket> {
        let peek = self.get(source_id)?;
        let source_key = peek.key();
        let target_key = source_key.with_state(target);

        let destination = {
            let _guard = self.locks.lock(&[&source_key, &target_key])?;

            let mut source = self.get(source_id)?;
            source.take_unit()?;

            if source_key == target_key {
                // Moving into its own state: the unit leaves and comes back.
                source.add_units(1);
                self.store.upsert(source.clone())?;
                source
            } else {
                let mut destination = match self.store.find_by_key(&target_key)? {
                    Some(existing) => existing,
                    None => Bucket::new(&source.item_type(), target, 0, source.reposition_value()),
                };
                destination.add_units(1);
                self.store.upsert_pair(source, destination.clone())?;
                destination
            }
        };

        tracing::info!(
            source_id = %source_id,
            destination_id = %destination.id_typed(),
            from = %peek.state(),
            to = %target,
            destination_amount = destination.amount(),
            "unit moved"
        );
        self.record(
            &destination,
            actor,
            MovementKind::StateChange { to: target },
            destination.amount(),
        );
        Ok(destination)
    }

    /// Overwrite amount and/or reposition value of one bucket.
    pub fn edit_attributes(
        &self,
        id: BucketId,
        edit: EditAttributes,
        actor: &ActorId,
    ) -> DomainResult<Bucket> {
        if edit.amount.is_some_and(|a| a < 0) {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        if edit.reposition_value.is_some_and(|v| v < 0) {
            return Err(DomainError::validation("reposition value cannot be negative"));
        }

        let key = self.get(id)?.key();
        let saved = {
            let _guard = self.locks.lock(&[&key])?;
            let mut bucket = self.get(id)?;
            if let Some(amount) = edit.amount {
                bucket.set_amount(amount);
            }
            if let Some(value) = edit.reposition_value {
                bucket.set_reposition_value(value);
            }
            self.store.upsert(bucket.clone())?;
            bucket
        };

        if edit.amount.is_some() || edit.reposition_value.is_some() {
            tracing::info!(bucket_id = %id, amount = saved.amount(), reposition_value = saved.reposition_value(), "bucket edited");
            self.record(&saved, actor, MovementKind::Update, saved.amount());
        }
        Ok(saved)
    }

    pub fn get(&self, id: BucketId) -> DomainResult<Bucket> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found(format!("tool not found: {id}")))
    }

    /// First bucket (in creation order) whose name matches, any category/state.
    pub fn get_by_name(&self, name: &str) -> DomainResult<Bucket> {
        let wanted = name.trim().to_lowercase();
        self.store
            .list()?
            .into_iter()
            .find(|b| b.name().to_lowercase() == wanted)
            .ok_or_else(|| DomainError::not_found(format!("tool not found: {}", name.trim())))
    }

    /// Buckets in `state`. For `Available`, empty buckets are left out.
    pub fn list_by_state(&self, state: ToolState) -> DomainResult<Vec<Bucket>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|b| b.state() == state)
            .filter(|b| !state.is_available() || b.amount() > 0)
            .collect())
    }

    pub fn list_available(&self) -> DomainResult<Vec<Bucket>> {
        self.list_by_state(ToolState::Available)
    }

    /// Ids of the buckets matching the exact (case-insensitive) triple.
    pub fn find_ids(&self, name: &str, category: &str, state: ToolState) -> DomainResult<Vec<BucketId>> {
        let key = ItemType::parse(name, category)?.key(state);
        Ok(self
            .store
            .find_by_key(&key)?
            .map(|b| vec![b.id_typed()])
            .unwrap_or_default())
    }

    /// Distinct item types, in the order they were first registered.
    pub fn names_with_category(&self) -> DomainResult<Vec<ItemType>> {
        let mut seen: Vec<ItemType> = Vec::new();
        for bucket in self.store.list()? {
            if !seen.iter().any(|t| bucket.is_item_type(t)) {
                seen.push(bucket.item_type());
            }
        }
        Ok(seen)
    }

    /// Units of an item type summed over every state.
    pub fn total_units(&self, item: &ItemType) -> DomainResult<i64> {
        Ok(self
            .store
            .list()?
            .iter()
            .filter(|b| b.is_item_type(item))
            .map(Bucket::amount)
            .sum())
    }

    fn record(&self, bucket: &Bucket, actor: &ActorId, kind: MovementKind, stock: i64) {
        let movement = MovementRecord {
            tool_id: bucket.id_typed(),
            name_snapshot: bucket.name().to_string(),
            category_snapshot: bucket.category().to_string(),
            actor: actor.clone(),
            kind,
            date: self.clock.today(),
            stock,
            recorded_at: Utc::now(),
        };
        if let Err(e) = self.audit.record_movement(movement) {
            tracing::warn!(bucket_id = %bucket.id_typed(), %kind, error = %e, "movement record dropped");
        }
    }
}
