use std::time::Duration;

use flightcache::config::Config;
use flightcache::{CachableResult, LockedCache, MemoryCacheProvider};
use flightcache_test::{self as test, Counter};

#[test]
fn test_cache_from_config() {
    test::setup();
    let yaml = r#"
        memory:
          name: profiles
          max_capacity: 100
        default_parameters:
          expiration: 1h
    "#;
    let config = Config::from_reader(yaml.as_bytes()).unwrap();
    flightcache::metrics::configure(&config.metrics).unwrap();

    let cache = LockedCache::new(MemoryCacheProvider::from_config(&config.memory));
    let calls = Counter::new();
    let compute = || {
        calls.hit();
        Ok(Some(CachableResult::new(
            42u32,
            config.default_parameters.clone(),
        )))
    };

    assert_eq!(config.default_parameters.expiration, Duration::from_secs(3600));
    assert_eq!(cache.get("answer", compute).unwrap(), Some(42));
    assert_eq!(cache.get("answer", compute).unwrap(), Some(42));
    assert_eq!(calls.get(), 1);
}
