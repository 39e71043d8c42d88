use std::time::Duration;

use serde::Deserialize;

/// A hint on how eagerly a stored entry may be evicted.
///
/// Providers are free to ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePriority {
    Low,
    BelowNormal,
    #[default]
    Normal,
    AboveNormal,
    High,
    /// The entry is not subject to capacity based eviction, it only goes away on expiration.
    NotRemovable,
}

/// Describes how a value should be stored in a cache.
///
/// A zero [`expiration`](Self::expiration) means "do not cache", regardless of everything else.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CachingParameters {
    /// How long the entry stays valid.
    ///
    /// For absolute expiration this is counted from the time the entry was stored, for sliding
    /// expiration from the last time it was read.
    #[serde(with = "humantime_serde")]
    pub expiration: Duration,
    /// Whether the expiration is sliding rather than absolute.
    pub sliding: bool,
    /// Keys of dependency roots. Invalidating a root invalidates the entry as well.
    pub dependency_keys: Vec<String>,
    /// Optional eviction priority.
    pub priority: Option<CachePriority>,
}

impl Default for CachingParameters {
    fn default() -> Self {
        Self::from_minutes(10)
    }
}

impl CachingParameters {
    /// Parameters with absolute expiration after `expiration`.
    pub fn new(expiration: Duration) -> Self {
        Self {
            expiration,
            sliding: false,
            dependency_keys: Vec::new(),
            priority: None,
        }
    }

    /// Parameters that tell providers not to store anything.
    pub fn no_cache() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn absolute(expiration: Duration) -> Self {
        Self::new(expiration)
    }

    pub fn sliding(expiration: Duration) -> Self {
        Self::new(expiration).with_sliding(true)
    }

    pub fn from_seconds(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self::from_seconds(minutes * 60)
    }

    pub fn from_hours(hours: u64) -> Self {
        Self::from_minutes(hours * 60)
    }

    pub fn from_days(days: u64) -> Self {
        Self::from_hours(days * 24)
    }

    pub fn with_sliding(mut self, sliding: bool) -> Self {
        self.sliding = sliding;
        self
    }

    pub fn with_priority(mut self, priority: CachePriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_dependency_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if nothing should be stored with these parameters.
    pub fn no_caching(&self) -> bool {
        self.expiration.is_zero()
    }

    /// Iterates over the non-empty dependency keys.
    pub fn dependency_keys(&self) -> impl Iterator<Item = &str> {
        self.dependency_keys
            .iter()
            .map(String::as_str)
            .filter(|key| !key.is_empty())
    }

    pub fn has_dependency_keys(&self) -> bool {
        self.dependency_keys().next().is_some()
    }
}

/// The outcome of a computation together with the parameters to cache it with.
///
/// A `CachableResult` with an absent `result` is a legitimate result which is cached as such.
/// Returning no `CachableResult` at all from a computation means that nothing is to be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachableResult<T> {
    /// The computed value, if any.
    pub result: Option<T>,
    /// How to store the value.
    pub parameters: CachingParameters,
    /// Whether the [`dependency_keys`](CachingParameters::dependency_keys) of the parameters were
    /// derived from `result` itself.
    pub dependency_keys_include_result: bool,
}

impl<T> CachableResult<T> {
    pub fn new(result: T, parameters: CachingParameters) -> Self {
        Self {
            result: Some(result),
            parameters,
            dependency_keys_include_result: false,
        }
    }

    /// A result without a value, which is still cached according to `parameters`.
    pub fn empty(parameters: CachingParameters) -> Self {
        Self {
            result: None,
            parameters,
            dependency_keys_include_result: false,
        }
    }

    pub fn from_option(result: Option<T>, parameters: CachingParameters) -> Self {
        Self {
            result,
            parameters,
            dependency_keys_include_result: false,
        }
    }

    pub fn with_dependency_keys_include_result(mut self, include: bool) -> Self {
        self.dependency_keys_include_result = include;
        self
    }

    /// Whether an absent `result` should be remembered in the cache.
    ///
    /// When the dependency keys were computed from the result, there is nothing meaningful to
    /// depend on for a missing result, so the absence is not cached in that case.
    pub(crate) fn should_cache_empty(&self) -> bool {
        !(self.dependency_keys_include_result && self.parameters.has_dependency_keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_helpers() {
        assert_eq!(
            CachingParameters::from_minutes(2).expiration,
            Duration::from_secs(120)
        );
        assert_eq!(
            CachingParameters::from_days(1).expiration,
            Duration::from_secs(86_400)
        );
        assert!(CachingParameters::sliding(Duration::from_secs(1)).sliding);
        assert!(!CachingParameters::absolute(Duration::from_secs(1)).sliding);
    }

    #[test]
    fn test_no_caching() {
        assert!(CachingParameters::no_cache().no_caching());
        assert!(
            CachingParameters::new(Duration::ZERO)
                .with_priority(CachePriority::High)
                .with_sliding(true)
                .no_caching()
        );
        assert!(!CachingParameters::from_seconds(1).no_caching());
    }

    #[test]
    fn test_empty_dependency_keys_are_ignored() {
        let params = CachingParameters::from_minutes(1).with_dependency_keys(["", ""]);
        assert!(!params.has_dependency_keys());

        let params = CachingParameters::from_minutes(1).with_dependency_keys(["", "a"]);
        assert_eq!(params.dependency_keys().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn test_should_cache_empty() {
        let plain = CachableResult::<u32>::empty(CachingParameters::from_minutes(1));
        assert!(plain.should_cache_empty());

        let flagged_without_keys = plain.clone().with_dependency_keys_include_result(true);
        assert!(flagged_without_keys.should_cache_empty());

        let keyed = CachableResult::<u32>::empty(
            CachingParameters::from_minutes(1).with_dependency_keys(["root"]),
        );
        assert!(keyed.should_cache_empty());
        assert!(!keyed.with_dependency_keys_include_result(true).should_cache_empty());
    }

    #[test]
    fn test_deserialize() {
        let params: CachingParameters = serde_yaml::from_str(
            r#"
            expiration: 5m
            sliding: true
            priority: not_removable
            "#,
        )
        .unwrap();

        assert_eq!(params.expiration, Duration::from_secs(300));
        assert!(params.sliding);
        assert_eq!(params.priority, Some(CachePriority::NotRemovable));
        assert!(params.dependency_keys.is_empty());
    }
}
