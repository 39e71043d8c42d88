use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::{CacheError, CacheValue};

/// The outcome of a single computation.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    /// The computation produced a value.
    Value(CacheValue),
    /// The computation produced no value, or there was nothing to cache.
    Empty,
    /// The computation failed.
    Failed(CacheError),
}

/// Coordinates a single computation for one key.
///
/// Exactly one caller gets to run the computation, by winning [`try_begin`](Self::try_begin).
/// Everybody else waits for the outcome, either by blocking the current thread or by suspending
/// the current task. An outcome is recorded exactly once and stays available afterwards, so a
/// waiter that only starts waiting after completion returns immediately.
#[derive(Debug, Default)]
pub struct ComputationGuard {
    started: AtomicBool,
    outcome: Mutex<Option<Outcome>>,
    /// Wakes up threads blocked in [`wait`](Self::wait).
    completed: Condvar,
    /// Wakes up tasks suspended in [`wait_async`](Self::wait_async).
    notify: Notify,
}

impl ComputationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the right to run the computation.
    ///
    /// Returns `true` to exactly one caller over the lifetime of the guard.
    pub fn try_begin(&self) -> bool {
        self.started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether some caller has claimed the computation.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Whether the outcome of the computation has been recorded.
    pub fn is_completed(&self) -> bool {
        self.lock_outcome().is_some()
    }

    fn outcome(&self) -> Option<Outcome> {
        self.lock_outcome().clone()
    }

    /// Records the outcome and wakes up all waiters.
    ///
    /// # Panics
    ///
    /// Recording an outcome twice is a bug in the caller and panics.
    pub(crate) fn complete(&self, outcome: Outcome) {
        let mut slot = self.lock_outcome();
        if slot.is_some() {
            drop(slot);
            panic!("outcome of a computation recorded twice");
        }
        *slot = Some(outcome);
        drop(slot);

        self.completed.notify_all();
        self.notify.notify_waiters();
    }

    /// Blocks the current thread until the outcome is recorded.
    pub(crate) fn wait(&self) -> Outcome {
        self.assert_started();

        let slot = self
            .completed
            .wait_while(self.lock_outcome(), |outcome| outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);

        match &*slot {
            Some(outcome) => outcome.clone(),
            None => unreachable!("woken up without an outcome"),
        }
    }

    /// Suspends the current task until the outcome is recorded.
    pub(crate) async fn wait_async(&self) -> Outcome {
        self.assert_started();

        loop {
            // Register interest before looking at the outcome, otherwise a completion in
            // between would go unnoticed.
            let mut notified = pin!(self.notify.notified());
            notified.as_mut().enable();

            if let Some(outcome) = self.outcome() {
                return outcome;
            }

            notified.await;
        }
    }

    fn assert_started(&self) {
        assert!(
            self.is_started(),
            "waiting on a computation that was never started"
        );
    }

    fn lock_outcome(&self) -> MutexGuard<'_, Option<Outcome>> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
