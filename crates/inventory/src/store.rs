use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use toolrent_core::{BucketId, DomainError, DomainResult};

use crate::bucket::{Bucket, BucketKey};

/// Persistence boundary for bucket rows.
///
/// The store itself does not serialize read-modify-write cycles; the engine
/// holds per-key locks around them. What the store must guarantee:
/// - `(name, category, state)` stays unique across rows
/// - `upsert_pair` writes both rows or neither (one local transaction)
/// - `list` returns rows in creation order
pub trait BucketStore: Send + Sync {
    fn get(&self, id: BucketId) -> DomainResult<Option<Bucket>>;

    fn find_by_key(&self, key: &BucketKey) -> DomainResult<Option<Bucket>>;

    fn upsert(&self, bucket: Bucket) -> DomainResult<()>;

    /// Persist the two rows touched by a state move atomically.
    fn upsert_pair(&self, first: Bucket, second: Bucket) -> DomainResult<()>;

    fn list(&self) -> DomainResult<Vec<Bucket>>;
}

impl<S> BucketStore for Arc<S>
where
    S: BucketStore + ?Sized,
{
    fn get(&self, id: BucketId) -> DomainResult<Option<Bucket>> {
        (**self).get(id)
    }

    fn find_by_key(&self, key: &BucketKey) -> DomainResult<Option<Bucket>> {
        (**self).find_by_key(key)
    }

    fn upsert(&self, bucket: Bucket) -> DomainResult<()> {
        (**self).upsert(bucket)
    }

    fn upsert_pair(&self, first: Bucket, second: Bucket) -> DomainResult<()> {
        (**self).upsert_pair(first, second)
    }

    fn list(&self) -> DomainResult<Vec<Bucket>> {
        (**self).list()
    }
}

#[derive(Debug, Default)]
struct Rows {
    // UUIDv7 ids sort by creation time.
    by_id: BTreeMap<BucketId, Bucket>,
    by_key: HashMap<BucketKey, BucketId>,
}

impl Rows {
    fn check_unique(&self, bucket: &Bucket) -> DomainResult<()> {
        match self.by_key.get(&bucket.key()) {
            Some(existing) if *existing != bucket.id_typed() => Err(DomainError::invariant(format!(
                "bucket key ({} - {}, {}) already owned by {existing}",
                bucket.name(),
                bucket.category(),
                bucket.state()
            ))),
            _ => Ok(()),
        }
    }

    fn write(&mut self, bucket: Bucket) {
        self.by_key.insert(bucket.key(), bucket.id_typed());
        self.by_id.insert(bucket.id_typed(), bucket);
    }
}

/// In-memory bucket table for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBucketStore {
    rows: RwLock<Rows>,
}

impl InMemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::unavailable("bucket store lock poisoned")
}

impl BucketStore for InMemoryBucketStore {
    fn get(&self, id: BucketId) -> DomainResult<Option<Bucket>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.by_id.get(&id).cloned())
    }

    fn find_by_key(&self, key: &BucketKey) -> DomainResult<Option<Bucket>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows
            .by_key
            .get(key)
            .and_then(|id| rows.by_id.get(id))
            .cloned())
    }

    fn upsert(&self, bucket: Bucket) -> DomainResult<()> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.check_unique(&bucket)?;
        rows.write(bucket);
        Ok(())
    }

    fn upsert_pair(&self, first: Bucket, second: Bucket) -> DomainResult<()> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.check_unique(&first)?;
        rows.check_unique(&second)?;
        if first.id_typed() != second.id_typed() && first.key() == second.key() {
            return Err(DomainError::invariant("two distinct buckets cannot share a key"));
        }
        rows.write(first);
        rows.write(second);
        Ok(())
    }

    fn list(&self) -> DomainResult<Vec<Bucket>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.by_id.values().cloned().collect())
    }
}
