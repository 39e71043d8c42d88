use std::sync::Arc;
use std::time::Duration;

use flightcache::{
    CachableResult, CacheError, CachingParameters, LockedCache, MemoryCacheProvider,
    ScopedCacheProvider,
};
use flightcache_test::{self as test, Counter};
use futures::future::join_all;

use crate::utils::RecordingProvider;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_share_one_computation() {
    test::setup();
    let cache = Arc::new(LockedCache::new(MemoryCacheProvider::default()));
    let calls = Counter::new();
    let key = test::unique_key("shared");

    let tasks = (0..32).map(|_| {
        let (cache, calls, key) = (Arc::clone(&cache), calls.clone(), key.clone());
        tokio::spawn(async move {
            cache
                .get_async(&key, || async {
                    calls.hit();
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(Some(CachableResult::new(
                        "aaa".to_owned(),
                        CachingParameters::from_minutes(1),
                    )))
                })
                .await
        })
    });

    for result in join_all(tasks).await {
        assert_eq!(result.unwrap().unwrap().as_deref(), Some("aaa"));
    }
    assert_eq!(calls.get(), 1);
    assert!(cache.locks().is_empty());
}

#[tokio::test]
async fn test_async_and_blocking_share_the_cache() {
    test::setup();
    let cache = LockedCache::new(RecordingProvider::new());
    let calls = Counter::new();

    let value = cache
        .get_async("k", || async {
            calls.hit();
            Ok(Some(CachableResult::new(1u64, CachingParameters::default())))
        })
        .await;
    assert_eq!(value.unwrap(), Some(1));

    let value = cache.get::<u64, _>("k", || {
        calls.hit();
        Ok(None)
    });
    assert_eq!(value.unwrap(), Some(1));

    assert_eq!(calls.get(), 1);
    assert_eq!(cache.provider().writes().len(), 1);
}

#[tokio::test]
async fn test_async_failure_is_retried() {
    test::setup();
    let cache = LockedCache::new(RecordingProvider::new());
    let calls = Counter::new();

    let result = cache
        .get_async::<String, _, _>("k", || async {
            calls.hit();
            Err(anyhow::anyhow!("backend unavailable"))
        })
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, CacheError::Computation(_)));
    assert_eq!(err.to_string(), "computation failed: backend unavailable");
    assert!(cache.provider().writes().is_empty());

    let result = cache
        .get_async("k", || async {
            calls.hit();
            Ok(Some(CachableResult::new(
                "ok".to_owned(),
                CachingParameters::default(),
            )))
        })
        .await;
    assert_eq!(result.unwrap().as_deref(), Some("ok"));
    assert_eq!(calls.get(), 2);
}

#[tokio::test]
async fn test_request_scopes_are_separate() {
    test::setup();
    let cache = &LockedCache::new(ScopedCacheProvider);
    let calls = &Counter::new();

    let lookup = move || {
        cache.get_async("k", move || async move {
            Ok(Some(CachableResult::new(
                calls.hit(),
                CachingParameters::default(),
            )))
        })
    };

    let first = ScopedCacheProvider::scope(async {
        let a = lookup().await.unwrap();
        let b = lookup().await.unwrap();
        (a, b)
    })
    .await;
    assert_eq!(first, (Some(1), Some(1)));

    let second = ScopedCacheProvider::scope(async { lookup().await.unwrap() }).await;
    assert_eq!(second, Some(2));
}
