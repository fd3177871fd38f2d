//! Property tests for the result cache

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use wordforge_cache::{CacheConfig, CacheError, Cacheable, LookupSource, MemoryStorage, ResultCache};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Length(usize);

impl Cacheable for Length {}

#[derive(Debug, Clone)]
struct TestError(#[allow(dead_code)] CacheError);

impl From<CacheError> for TestError {
    fn from(err: CacheError) -> Self {
        TestError(err)
    }
}

fn cache() -> ResultCache<Length, TestError> {
    ResultCache::with_config(
        Arc::new(MemoryStorage::new()),
        CacheConfig {
            ttl: Some(Duration::from_secs(300)),
            enable_metrics: true,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_each_key_is_computed_once(keys in prop::collection::vec("[a-d]{1,2}", 1..40)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let cache = cache();
        let computations = Arc::new(AtomicUsize::new(0));
        let mut first_seen: HashMap<String, LookupSource> = HashMap::new();

        runtime.block_on(async {
            for key in &keys {
                let counter = Arc::clone(&computations);
                let len = key.len();
                let lookup = cache
                    .get_or_compute(key, move || async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, TestError>(Length(len))
                    })
                    .await
                    .unwrap();

                assert_eq!(*lookup.value, Length(len));
                let expected = if first_seen.contains_key(key) {
                    LookupSource::Hit
                } else {
                    LookupSource::Computed
                };
                assert_eq!(lookup.source, expected);
                first_seen.entry(key.clone()).or_insert(lookup.source);
            }
        });

        let stats = cache.stats();
        prop_assert_eq!(computations.load(Ordering::SeqCst), first_seen.len());
        prop_assert_eq!(stats.hits + stats.misses, keys.len() as u64);
        prop_assert_eq!(stats.misses, first_seen.len() as u64);
        prop_assert_eq!(cache.in_flight(), 0);
    }

    #[test]
    fn prop_put_then_get_returns_value(key in "[a-z]{1,16}", value in 0usize..10_000) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let cache = cache();

        let fetched = runtime.block_on(async {
            cache.put(&key, &Length(value)).await.unwrap();
            cache.get(&key).await.unwrap()
        });
        prop_assert_eq!(fetched, Some(Length(value)));
    }

    #[test]
    fn prop_invalidate_forces_recompute(key in "[a-z]{1,8}") {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let cache = cache();

        let source = runtime.block_on(async {
            let compute = || async { Ok::<_, TestError>(Length(1)) };
            cache.get_or_compute(&key, compute).await.unwrap();
            assert!(cache.invalidate(&key).await.unwrap());
            cache.get_or_compute(&key, compute).await.unwrap().source
        });
        prop_assert_eq!(source, LookupSource::Computed);
    }
}
