use dashmap::DashMap;

use crate::{CacheProvider, CacheValue, CachingParameters};

/// A provider that keeps everything it is given, forever.
///
/// Expiration and priorities are ignored, apart from the "no caching" case. This is mostly useful
/// for tests, as the stored entries and their parameters can be inspected.
#[derive(Debug, Default)]
pub struct DummyCacheProvider {
    items: DashMap<String, (CacheValue, CachingParameters)>,
}

impl DummyCacheProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// The parameters the entry for `key` was stored with.
    pub fn parameters_for(&self, key: &str) -> Option<CachingParameters> {
        self.items.get(key).map(|item| item.value().1.clone())
    }
}

impl CacheProvider for DummyCacheProvider {
    fn get(&self, key: &str) -> Option<CacheValue> {
        self.items.get(key).map(|item| item.value().0.clone())
    }

    fn add(&self, key: &str, value: Option<CacheValue>, parameters: &CachingParameters) {
        let Some(value) = value else {
            self.remove(key);
            return;
        };
        if parameters.no_caching() {
            return;
        }
        self.items.insert(key.to_owned(), (value, parameters.clone()));
    }

    fn clear(&self) {
        self.items.clear();
    }

    fn remove(&self, key: &str) {
        self.items.remove(key);
    }
}
