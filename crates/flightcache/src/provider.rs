use std::any::Any;
use std::sync::Arc;

use crate::CachingParameters;

/// A type-erased value as held by a [`CacheProvider`].
pub type CacheValue = Arc<dyn Any + Send + Sync>;

/// A storage backend for cached values.
///
/// Providers have to be safe to use from multiple threads concurrently. None of the methods is
/// expected to block for any significant time.
pub trait CacheProvider: Send + Sync {
    /// Looks up the value stored under `key`.
    ///
    /// A missing or expired entry is reported as `None`.
    fn get(&self, key: &str) -> Option<CacheValue>;

    /// Adds or replaces the entry for `key`.
    ///
    /// Adding `None` is the same as [`remove`](Self::remove). Nothing is stored when
    /// `parameters` ask for [no caching](CachingParameters::no_caching).
    fn add(&self, key: &str, value: Option<CacheValue>, parameters: &CachingParameters);

    /// Removes all entries.
    fn clear(&self);

    /// Removes the entry for `key`, if present.
    fn remove(&self, key: &str);
}

impl<P: CacheProvider + ?Sized> CacheProvider for Arc<P> {
    fn get(&self, key: &str) -> Option<CacheValue> {
        (**self).get(key)
    }

    fn add(&self, key: &str, value: Option<CacheValue>, parameters: &CachingParameters) {
        (**self).add(key, value, parameters)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

impl<P: CacheProvider + ?Sized> CacheProvider for &P {
    fn get(&self, key: &str) -> Option<CacheValue> {
        (**self).get(key)
    }

    fn add(&self, key: &str, value: Option<CacheValue>, parameters: &CachingParameters) {
        (**self).add(key, value, parameters)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

impl<P: CacheProvider + ?Sized> CacheProvider for Box<P> {
    fn get(&self, key: &str) -> Option<CacheValue> {
        (**self).get(key)
    }

    fn add(&self, key: &str, value: Option<CacheValue>, parameters: &CachingParameters) {
        (**self).add(key, value, parameters)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}
