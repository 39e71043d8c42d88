use std::collections::HashMap;
use std::sync::Mutex;

use flightcache::{CacheProvider, CacheValue, CachingParameters};

/// A provider that keeps everything and records every write it receives.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    items: Mutex<HashMap<String, CacheValue>>,
    writes: Mutex<Vec<(String, bool, CachingParameters)>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes so far, as `(key, has_value, parameters)`.
    pub fn writes(&self) -> Vec<(String, bool, CachingParameters)> {
        self.writes.lock().unwrap().clone()
    }
}

impl CacheProvider for RecordingProvider {
    fn get(&self, key: &str) -> Option<CacheValue> {
        self.items.lock().unwrap().get(key).cloned()
    }

    fn add(&self, key: &str, value: Option<CacheValue>, parameters: &CachingParameters) {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_owned(), value.is_some(), parameters.clone()));

        let mut items = self.items.lock().unwrap();
        match value {
            Some(value) => items.insert(key.to_owned(), value),
            None => items.remove(key),
        };
    }

    fn clear(&self) {
        self.items.lock().unwrap().clear();
    }

    fn remove(&self, key: &str) {
        self.items.lock().unwrap().remove(key);
    }
}
