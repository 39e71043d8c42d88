use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;

use crate::{CacheProvider, CacheValue, CachingParameters};

type RequestItems = Arc<DashMap<String, CacheValue>>;

tokio::task_local! {
    static REQUEST_ITEMS: RequestItems;
}

/// A provider that keeps entries for the duration of a request scope.
///
/// A scope is entered with [`ScopedCacheProvider::scope`] for async code or
/// [`ScopedCacheProvider::sync_scope`] for blocking code. Everything stored within the scope is
/// dropped when it ends. Outside of any scope, the provider stores nothing.
///
/// Scopes are bound to the current task, so work spawned onto other tasks does not see them.
/// Expiration is not tracked, entries live as long as the scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopedCacheProvider;

impl ScopedCacheProvider {
    /// Runs `future` within a fresh request scope.
    pub async fn scope<F: Future>(future: F) -> F::Output {
        REQUEST_ITEMS.scope(RequestItems::default(), future).await
    }

    /// Runs `f` within a fresh request scope.
    pub fn sync_scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        REQUEST_ITEMS.sync_scope(RequestItems::default(), f)
    }

    /// Whether the caller is currently within a request scope.
    pub fn in_scope() -> bool {
        REQUEST_ITEMS.try_with(|_| ()).is_ok()
    }

    fn with_items<R: Default>(f: impl FnOnce(&RequestItems) -> R) -> R {
        REQUEST_ITEMS.try_with(f).unwrap_or_default()
    }
}

impl CacheProvider for ScopedCacheProvider {
    fn get(&self, key: &str) -> Option<CacheValue> {
        Self::with_items(|items| items.get(key).map(|value| value.value().clone()))
    }

    fn add(&self, key: &str, value: Option<CacheValue>, parameters: &CachingParameters) {
        let Some(value) = value else {
            self.remove(key);
            return;
        };
        if parameters.no_caching() {
            return;
        }
        Self::with_items(|items| {
            items.insert(key.to_owned(), value);
        })
    }

    fn clear(&self) {
        Self::with_items(|items| items.clear())
    }

    fn remove(&self, key: &str) {
        Self::with_items(|items| {
            items.remove(key);
        })
    }
}
