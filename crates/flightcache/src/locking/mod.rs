//! Single-flight computation of missing cache entries.
//!
//! A lookup through [`LockedCache`] first goes to the [`CacheProvider`]. Only on a miss does it
//! consult the [`LockRegistry`] for the [`ComputationGuard`] of that key:
//!
//! - The first caller to claim the guard runs the computation, stores its result in the provider,
//!   records the outcome in the guard and unregisters the guard again.
//! - Every other caller that finds the guard waits for that outcome and returns it as its own.
//!
//! The state of a key thus goes from "no guard" over "computing" to "completed" and back to "no
//! guard", at which point a new miss starts a new computation. Failures are handed to all waiters
//! of the failed computation but are never stored, so the next miss retries.

use std::future::Future;
use std::sync::Arc;

use crate::{Cachable, CachableResult, CacheError, CacheProvider, CacheValue};

mod guard;
mod registry;

pub use guard::ComputationGuard;
pub(crate) use guard::Outcome;
pub use registry::LockRegistry;

/// Stored in place of a computed value that was absent, to tell it apart from a miss.
struct EmptyResult;

/// The result of a computation callback.
type Computed<T> = anyhow::Result<Option<CachableResult<T>>>;

/// A [`CacheProvider`] paired with single-flight computation of missing entries.
///
/// Each `LockedCache` has its own [`LockRegistry`], so computations are only coalesced between
/// callers going through the same instance. Share it behind an [`Arc`] to coalesce across
/// threads and tasks.
#[derive(Debug)]
pub struct LockedCache<P> {
    provider: P,
    locks: LockRegistry,
}

/// How a lookup proceeds after consulting the cache and the registry.
enum Flight<'a> {
    /// The outcome is already known.
    Done(Outcome),
    /// Another caller is computing, wait for its outcome.
    Join(Arc<ComputationGuard>),
    /// This caller computes.
    Lead(Execution<'a>),
}

/// The right to run the computation for a key, held by the winning caller.
///
/// Dropping it without calling [`finish`](Self::finish) completes the guard as abandoned, so
/// waiters are released even if the computation panics or its future is dropped.
struct Execution<'a> {
    key: &'a str,
    guard: Arc<ComputationGuard>,
    locks: &'a LockRegistry,
    finished: bool,
}

impl Execution<'_> {
    fn finish(mut self, outcome: Outcome) -> Outcome {
        self.finished = true;
        self.guard.complete(outcome.clone());
        self.locks.release(self.key, &self.guard);
        outcome
    }
}

impl Drop for Execution<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::debug!(key = self.key, "Computation abandoned before completion");
        self.guard.complete(Outcome::Failed(CacheError::Abandoned {
            key: self.key.to_owned(),
        }));
        self.locks.release(self.key, &self.guard);
    }
}

impl<P: CacheProvider> LockedCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            locks: LockRegistry::new(),
        }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The computations currently in flight.
    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Gets the value cached under `key`, computing it with `create` on a miss.
    ///
    /// `create` runs at most once among all concurrent callers for the same `key`; the others
    /// block the current thread until it finishes and receive the same outcome.
    ///
    /// `create` may return:
    /// - a [`CachableResult`] with a value, which is cached and returned,
    /// - a [`CachableResult`] without a value, whose absence is cached (unless its dependency
    ///   keys were derived from the missing value) and `None` is returned,
    /// - no [`CachableResult`] at all, in which case nothing is cached and `None` is returned,
    /// - an error, which is returned as [`CacheError::Computation`] to all concurrent callers
    ///   without being cached.
    ///
    /// `create` may itself look up other keys of this cache. It must not wait for its own key,
    /// directly or through a cycle of keys, as that deadlocks.
    pub fn get<T, F>(&self, key: &str, create: F) -> Result<Option<T>, CacheError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Computed<T>,
    {
        let outcome = match self.begin(key)? {
            Flight::Done(outcome) => outcome,
            Flight::Join(guard) => guard.wait(),
            Flight::Lead(execution) => {
                let computed = create();
                execution.finish(self.publish(key, computed))
            }
        };
        resolve(key, outcome)
    }

    /// Gets the value cached under `key`, computing it with `create` on a miss.
    ///
    /// This is the async counterpart of [`get`](Self::get) with the same semantics, except that
    /// waiting for a concurrent computation suspends the current task instead of blocking the
    /// thread. Dropping the returned future while it computes releases all waiters with
    /// [`CacheError::Abandoned`].
    pub async fn get_async<T, F, Fut>(
        &self,
        key: &str,
        create: F,
    ) -> Result<Option<T>, CacheError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Computed<T>>,
    {
        let outcome = match self.begin(key)? {
            Flight::Done(outcome) => outcome,
            Flight::Join(guard) => guard.wait_async().await,
            Flight::Lead(execution) => {
                let computed = create().await;
                execution.finish(self.publish(key, computed))
            }
        };
        resolve(key, outcome)
    }

    /// Like [`get`](Self::get), but returns `T::default()` if there is no value.
    pub fn get_or_default<T, F>(&self, key: &str, create: F) -> Result<T, CacheError>
    where
        T: Clone + Default + Send + Sync + 'static,
        F: FnOnce() -> Computed<T>,
    {
        self.get(key, create).map(Option::unwrap_or_default)
    }

    /// Gets the cached value of a [`Cachable`] object, computing it on a miss.
    pub fn get_cachable<T, C>(&self, cachable: &C) -> Result<Option<T>, CacheError>
    where
        T: Clone + Send + Sync + 'static,
        C: Cachable<T> + ?Sized,
    {
        self.get(&cachable.cache_key(), || cachable.cached_value())
    }

    /// The async counterpart of [`get_cachable`](Self::get_cachable).
    ///
    /// The value is still computed synchronously by [`Cachable::cached_value`], but waiting for a
    /// concurrent computation of the same key suspends the current task.
    pub async fn get_cachable_async<T, C>(&self, cachable: &C) -> Result<Option<T>, CacheError>
    where
        T: Clone + Send + Sync + 'static,
        C: Cachable<T> + ?Sized,
    {
        let key = cachable.cache_key();
        self.get_async(&key, || async { cachable.cached_value() }).await
    }

    /// Removes the entry for `key` from the provider.
    ///
    /// This does not affect a computation in flight for `key`, which will store its result once
    /// done.
    pub fn invalidate(&self, key: &str) {
        self.provider.remove(key);
    }

    /// Looks `key` up and decides how this caller proceeds.
    fn begin<'a>(&'a self, key: &'a str) -> Result<Flight<'a>, CacheError> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        metric!(counter("caches.access") += 1);
        if let Some(value) = self.provider.get(key) {
            metric!(counter("caches.memory.hit") += 1);
            return Ok(Flight::Done(classify_stored(value)));
        }

        tracing::trace!(key, "Cache miss");
        let guard = self.locks.acquire(key);
        if !guard.try_begin() {
            tracing::trace!(key, "Joining computation in flight");
            metric!(counter("caches.coalesced") += 1);
            return Ok(Flight::Join(guard));
        }

        let execution = Execution {
            key,
            guard,
            locks: &self.locks,
            finished: false,
        };

        // A previous computation may have stored its result after our lookup, but before its
        // guard was unregistered and we created a fresh one.
        if let Some(value) = self.provider.get(key) {
            return Ok(Flight::Done(execution.finish(classify_stored(value))));
        }

        tracing::trace!(key, "Starting computation");
        metric!(gauge("caches.in_flight") = self.locks.len() as u64);
        Ok(Flight::Lead(execution))
    }

    /// Stores the outcome of a computation in the provider, as far as it is to be cached.
    fn publish<T>(&self, key: &str, computed: Computed<T>) -> Outcome
    where
        T: Send + Sync + 'static,
    {
        metric!(counter("caches.computation") += 1);

        let cachable = match computed {
            Ok(Some(cachable)) => cachable,
            Ok(None) => {
                tracing::trace!(key, "Computation returned nothing to cache");
                return Outcome::Empty;
            }
            Err(err) => {
                let dynerr: &dyn std::error::Error = err.as_ref();
                tracing::debug!(key, error = dynerr, "Computation failed");
                metric!(counter("caches.computation.failed") += 1);
                return Outcome::Failed(err.into());
            }
        };

        let cache_empty = cachable.should_cache_empty();
        let CachableResult { result, parameters, .. } = cachable;

        tracing::trace!(key, has_value = result.is_some(), "Computation finished");
        match result {
            Some(value) => {
                let value: CacheValue = Arc::new(value);
                self.provider.add(key, Some(Arc::clone(&value)), &parameters);
                Outcome::Value(value)
            }
            None => {
                if cache_empty {
                    self.provider.add(key, Some(Arc::new(EmptyResult)), &parameters);
                }
                Outcome::Empty
            }
        }
    }
}

impl<P: CacheProvider + Default> Default for LockedCache<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

/// Tells a stored value apart from the stored absence of a value.
fn classify_stored(value: CacheValue) -> Outcome {
    if value.is::<EmptyResult>() {
        Outcome::Empty
    } else {
        Outcome::Value(value)
    }
}

/// Turns an outcome into what is handed to the caller.
fn resolve<T>(key: &str, outcome: Outcome) -> Result<Option<T>, CacheError>
where
    T: Clone + 'static,
{
    match outcome {
        Outcome::Value(value) => match value.downcast_ref::<T>() {
            Some(value) => Ok(Some(value.clone())),
            None => Err(CacheError::TypeMismatch {
                key: key.to_owned(),
                expected: std::any::type_name::<T>(),
            }),
        },
        Outcome::Empty => Ok(None),
        Outcome::Failed(err) => Err(err),
    }
}
