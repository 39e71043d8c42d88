use crate::{CacheProvider, CacheValue, CachingParameters};

/// A pass-through provider that never holds anything.
///
/// Every lookup is a miss, so with this provider every call to
/// [`LockedCache::get`](crate::LockedCache::get) runs the computation, although concurrent calls
/// are still coalesced.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCacheProvider;

impl CacheProvider for NullCacheProvider {
    fn get(&self, _key: &str) -> Option<CacheValue> {
        None
    }

    fn add(&self, _key: &str, _value: Option<CacheValue>, _parameters: &CachingParameters) {}

    fn clear(&self) {}

    fn remove(&self, _key: &str) {}
}
