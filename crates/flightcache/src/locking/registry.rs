use std::sync::Arc;

use dashmap::DashMap;

use super::ComputationGuard;

/// The set of computations currently in flight, by cache key.
///
/// Entries only exist while a computation for their key is outstanding. Insertion and removal
/// only contend with operations on keys of the same shard, there is no lock spanning all keys.
#[derive(Debug, Default)]
pub struct LockRegistry {
    guards: DashMap<String, Arc<ComputationGuard>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the guard registered for `key`, registering a fresh one if there is none.
    pub(crate) fn acquire(&self, key: &str) -> Arc<ComputationGuard> {
        if let Some(guard) = self.guards.get(key) {
            return Arc::clone(&guard);
        }
        // NOTE: the entry holds a shard lock, it must not outlive this statement.
        Arc::clone(&self.guards.entry(key.to_owned()).or_default())
    }

    /// Unregisters `guard` from `key`.
    ///
    /// Nothing is removed if `key` has meanwhile been taken over by another guard, so callers
    /// that joined that other guard keep finding it. Returns whether `guard` was removed.
    pub(crate) fn release(&self, key: &str, guard: &Arc<ComputationGuard>) -> bool {
        self.guards
            .remove_if(key, |_, registered| Arc::ptr_eq(registered, guard))
            .is_some()
    }

    /// Returns the guard of the computation in flight for `key`.
    pub fn get(&self, key: &str) -> Option<Arc<ComputationGuard>> {
        self.guards.get(key).map(|guard| Arc::clone(guard.value()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.guards.contains_key(key)
    }

    /// The number of computations in flight.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Forgets about all computations in flight.
    ///
    /// Callers already waiting on a guard still receive its outcome, but new callers no longer
    /// join it.
    pub fn clear(&self) {
        self.guards.clear();
    }
}
