use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;

use crate::{CachePriority, CacheProvider, CacheValue, CachingParameters};

/// Configuration of a [`MemoryCacheProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryCacheConfig {
    /// Name of the underlying cache, used for diagnostics.
    pub name: String,
    /// Maximum number of entries to keep.
    ///
    /// When exceeded, the least valuable entries are evicted. Unlimited by default.
    pub max_capacity: Option<u64>,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            name: "flightcache".into(),
            max_capacity: None,
        }
    }
}

/// An item saved in the in-memory moka cache.
#[derive(Clone)]
struct MemoryItem {
    value: CacheValue,
    expiration: Duration,
    sliding: bool,
    priority: Option<CachePriority>,
    /// Dependency roots along with the stamp they had when the item was stored.
    dependencies: Arc<[(String, u64)]>,
}

/// A [`moka::Expiry`] that applies the absolute or sliding expiration of each item.
struct ItemExpiration;

impl moka::Expiry<String, MemoryItem> for ItemExpiration {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &MemoryItem,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expiration)
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &MemoryItem,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        if value.sliding {
            Some(value.expiration)
        } else {
            duration_until_expiry
        }
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &MemoryItem,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expiration)
    }
}

/// A provider holding entries in memory with absolute or sliding expiration.
///
/// Entries stored with [dependency keys](CachingParameters::dependency_keys) are tied to a
/// dependency root per key. Roots are created on demand and never expire; removing a root key
/// through [`remove`](CacheProvider::remove) invalidates every entry that depends on it.
pub struct MemoryCacheProvider {
    items: moka::sync::Cache<String, MemoryItem>,
    roots: DashMap<String, u64>,
    next_stamp: AtomicU64,
}

impl fmt::Debug for MemoryCacheProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCacheProvider")
            .field("name", &self.items.name())
            .field("in-memory items", &self.items.entry_count())
            .field("dependency roots", &self.roots.len())
            .finish()
    }
}

impl Default for MemoryCacheProvider {
    fn default() -> Self {
        Self::from_config(&MemoryCacheConfig::default())
    }
}

impl MemoryCacheProvider {
    pub fn from_config(config: &MemoryCacheConfig) -> Self {
        let mut builder = moka::sync::Cache::builder()
            .name(&config.name)
            .expire_after(ItemExpiration);

        if let Some(max_capacity) = config.max_capacity {
            // NOTE: zero-weight items do not count towards the capacity.
            builder = builder
                .max_capacity(max_capacity)
                .weigher(|_key, item: &MemoryItem| match item.priority {
                    Some(CachePriority::NotRemovable) => 0,
                    _ => 1,
                });
        }

        Self {
            items: builder.build(),
            roots: DashMap::new(),
            next_stamp: AtomicU64::new(1),
        }
    }

    /// Returns the current stamp of the dependency root `key`, creating the root if needed.
    fn ensure_root(&self, key: &str) -> u64 {
        if let Some(stamp) = self.roots.get(key) {
            return *stamp;
        }
        *self
            .roots
            .entry(key.to_owned())
            .or_insert_with(|| self.next_stamp.fetch_add(1, Ordering::Relaxed))
    }

    fn dependencies_intact(&self, item: &MemoryItem) -> bool {
        item.dependencies.iter().all(|(root, stamp)| {
            self.roots
                .get(root.as_str())
                .is_some_and(|current| *current == *stamp)
        })
    }
}

impl CacheProvider for MemoryCacheProvider {
    fn get(&self, key: &str) -> Option<CacheValue> {
        let item = self.items.get(key)?;

        if !self.dependencies_intact(&item) {
            tracing::trace!(key, "Dropping entry with invalidated dependencies");
            self.items.invalidate(key);
            return None;
        }

        Some(item.value)
    }

    fn add(&self, key: &str, value: Option<CacheValue>, parameters: &CachingParameters) {
        let Some(value) = value else {
            self.remove(key);
            return;
        };

        if parameters.no_caching() {
            return;
        }

        let dependencies = parameters
            .dependency_keys()
            .map(|root| (root.to_owned(), self.ensure_root(root)))
            .collect();

        let item = MemoryItem {
            value,
            expiration: parameters.expiration,
            sliding: parameters.sliding,
            priority: parameters.priority,
            dependencies,
        };
        self.items.insert(key.to_owned(), item);
    }

    fn clear(&self) {
        self.items.invalidate_all();
        self.roots.clear();
    }

    fn remove(&self, key: &str) {
        self.items.invalidate(key);
        self.roots.remove(key);
    }
}
