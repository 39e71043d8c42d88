//! Building cache keys.
//!
//! Keys are plain strings. [`CacheKeyBuilder`] composes them from parts in a `{a}{b}{c}` format,
//! and [`dependency_key`] creates keys of dependency roots for use in
//! [`CachingParameters::dependency_keys`](crate::CachingParameters::dependency_keys).

mod builder;
mod dependency;

pub use builder::{CacheKeyBuilder, CacheKeyPart, Keyed};
pub use dependency::{DEPENDENCY_ROOT_PREFIX, dependency_key, dependency_keys};

use crate::CachableResult;

/// An object that can provide a cache key for itself.
pub trait CacheKeyProvider {
    /// Returns the cache key of this object.
    fn cache_key(&self) -> String;
}

/// An object that knows both its cache key and how to compute its cached value.
///
/// See [`LockedCache::get_cachable`](crate::LockedCache::get_cachable).
pub trait Cachable<T>: CacheKeyProvider {
    /// Computes the value to cache, see [`LockedCache::get`](crate::LockedCache::get) for the
    /// meaning of the possible results.
    fn cached_value(&self) -> anyhow::Result<Option<CachableResult<T>>>;
}

/// Builds a cache key out of the given parts.
///
/// ```
/// let user = 42u32;
/// let tags = ["a", "b"];
/// assert_eq!(flightcache::cache_key!("users", user, &tags[..]), "{users}{42}{:a:b:}");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($($part:expr),+ $(,)?) => {
        $crate::CacheKeyBuilder::new()
            $(.part($part))+
            .build()
    };
}
