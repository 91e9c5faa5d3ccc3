//! Per-key mutual exclusion.
//!
//! Each key gets a lazily created lock (a `Mutex<bool>` flag + `Condvar`).
//! A caller that needs several keys acquires them in sorted order, so two
//! moves between the same pair of buckets cannot deadlock. Bucket keys are
//! the default; the loan orchestrator locks loan ids with the same registry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex};

use toolrent_core::{DomainError, DomainResult};

use crate::bucket::BucketKey;

#[derive(Debug, Default)]
struct KeyLock {
    held: Mutex<bool>,
    wake: Condvar,
}

impl KeyLock {
    fn acquire(&self) -> DomainResult<()> {
        let mut held = self.held.lock().map_err(|_| poisoned())?;
        while *held {
            held = self.wake.wait(held).map_err(|_| poisoned())?;
        }
        *held = true;
        Ok(())
    }

    fn release(&self) {
        if let Ok(mut held) = self.held.lock() {
            *held = false;
            self.wake.notify_one();
        }
    }
}

fn poisoned() -> DomainError {
    DomainError::unavailable("key lock poisoned")
}

/// Registry of per-key locks.
#[derive(Debug)]
pub struct KeyLocks<K = BucketKey> {
    locks: Mutex<HashMap<K, Arc<KeyLock>>>,
}

impl<K> Default for KeyLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyLocks<K>
where
    K: Clone + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every key in `keys` is held by the caller.
    ///
    /// Duplicates are collapsed; the returned guard releases all keys on drop.
    pub fn lock(&self, keys: &[&K]) -> DomainResult<KeyGuard> {
        let mut ordered: Vec<&K> = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        let handles = {
            let mut locks = self.locks.lock().map_err(|_| poisoned())?;
            ordered
                .into_iter()
                .map(|k| locks.entry(k.clone()).or_default().clone())
                .collect::<Vec<_>>()
        };

        let mut guard = KeyGuard { held: Vec::with_capacity(handles.len()) };
        for handle in handles {
            handle.acquire()?;
            guard.held.push(handle);
        }
        Ok(guard)
    }
}

/// Held keys; released in reverse acquisition order on drop.
#[derive(Debug)]
pub struct KeyGuard {
    held: Vec<Arc<KeyLock>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        while let Some(lock) = self.held.pop() {
            lock.release();
        }
    }
}
