use std::sync::Barrier;
use std::thread;
use std::time::Duration;

use flightcache::keys::dependency_key;
use flightcache::{
    CachableResult, CachePriority, CachingParameters, LockedCache, MemoryCacheProvider,
    ScopedCacheProvider, cache_key,
};
use flightcache_test::{self as test, Counter};

use crate::utils::RecordingProvider;

#[test]
fn test_parameters_reach_the_provider() {
    test::setup();
    let cache = LockedCache::new(RecordingProvider::new());
    let key = test::unique_key("params");
    let parameters = CachingParameters::from_seconds(30)
        .with_sliding(true)
        .with_priority(CachePriority::High);

    let value = cache.get(&key, || {
        Ok(Some(CachableResult::new(vec![1u8, 2, 3], parameters.clone())))
    });
    assert_eq!(value.unwrap(), Some(vec![1, 2, 3]));

    let writes = cache.provider().writes();
    assert_eq!(writes, vec![(key, true, parameters)]);
}

#[test]
fn test_many_keys_from_many_threads() {
    test::setup();
    let cache = LockedCache::new(MemoryCacheProvider::default());
    let calls: Vec<_> = (0..4).map(|_| Counter::new()).collect();
    let barrier = Barrier::new(16);

    thread::scope(|s| {
        for i in 0..16 {
            let (cache, calls, barrier) = (&cache, &calls, &barrier);
            s.spawn(move || {
                let key = cache_key!("item", i % 4);
                barrier.wait();
                let value = cache.get(&key, || {
                    calls[i % 4].hit();
                    thread::sleep(Duration::from_millis(50));
                    Ok(Some(CachableResult::new(
                        i % 4,
                        CachingParameters::from_minutes(1),
                    )))
                });
                assert_eq!(value.unwrap(), Some(i % 4));
            });
        }
    });

    for counter in &calls {
        assert_eq!(counter.get(), 1);
    }
    assert!(cache.locks().is_empty());
}

#[test]
fn test_invalidating_a_dependency_recomputes() {
    test::setup();
    let cache = LockedCache::new(MemoryCacheProvider::default());
    let calls = Counter::new();
    let root = dependency_key("user", 7u32);
    let compute = || {
        let n = calls.hit();
        let parameters =
            CachingParameters::from_minutes(1).with_dependency_keys([root.clone()]);
        Ok(Some(CachableResult::new(format!("profile v{n}"), parameters)))
    };

    assert_eq!(cache.get("profile", compute).unwrap().unwrap(), "profile v1");
    assert_eq!(cache.get("profile", compute).unwrap().unwrap(), "profile v1");

    cache.invalidate(&root);
    assert_eq!(cache.get("profile", compute).unwrap().unwrap(), "profile v2");
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_expired_entries_are_recomputed() {
    test::setup();
    let cache = LockedCache::new(MemoryCacheProvider::default());
    let calls = Counter::new();
    let compute = || {
        Ok(Some(CachableResult::new(
            calls.hit(),
            CachingParameters::new(Duration::from_millis(50)),
        )))
    };

    assert_eq!(cache.get("k", compute).unwrap(), Some(1));
    assert_eq!(cache.get("k", compute).unwrap(), Some(1));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(cache.get("k", compute).unwrap(), Some(2));
}

#[test]
fn test_no_cache_parameters_still_return_the_value() {
    test::setup();
    let cache = LockedCache::new(MemoryCacheProvider::default());
    let calls = Counter::new();
    let compute = || {
        calls.hit();
        Ok(Some(CachableResult::new("fresh", CachingParameters::no_cache())))
    };

    assert_eq!(cache.get("k", compute).unwrap(), Some("fresh"));
    assert_eq!(cache.get("k", compute).unwrap(), Some("fresh"));
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_request_scope() {
    test::setup();
    let cache = LockedCache::new(ScopedCacheProvider);
    let calls = Counter::new();
    let compute = || {
        Ok(Some(CachableResult::new(
            calls.hit(),
            CachingParameters::default(),
        )))
    };

    ScopedCacheProvider::sync_scope(|| {
        assert_eq!(cache.get("k", compute).unwrap(), Some(1));
        assert_eq!(cache.get("k", compute).unwrap(), Some(1));
    });
    ScopedCacheProvider::sync_scope(|| {
        assert_eq!(cache.get("k", compute).unwrap(), Some(2));
    });
}
