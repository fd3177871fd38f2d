//! Single-flight table
//!
//! Maps a key to the shared future of the computation currently running for it.
//! The first caller for a key (the leader) spawns the computation on its own task;
//! later callers (followers) clone the shared future and receive the same `Arc`.
//! The table lock is only held while deciding who leads, never across the
//! computation itself. Because the computation is spawned, it runs to completion
//! even if every caller stops waiting.

use std::{collections::HashMap, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, instrument::WithSubscriber};

use crate::CacheError;

/// Whether a caller started the computation or attached to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightRole {
    Leader,
    Follower,
}

/// Shared handle to an in-flight computation
pub type Flight<T, E> = Shared<BoxFuture<'static, Result<Arc<T>, E>>>;

type FlightTable<T, E> = Arc<Mutex<HashMap<String, Flight<T, E>>>>;

/// Removes the key once the computation finishes, including on panic.
struct FlightGuard<T, E> {
    table: FlightTable<T, E>,
    key: String,
}

impl<T, E> Drop for FlightGuard<T, E> {
    fn drop(&mut self) {
        self.table.lock().remove(&self.key);
    }
}

/// At-most-one concurrent computation per key
pub struct SingleFlight<T, E> {
    in_flight: FlightTable<T, E>,
}

impl<T, E> SingleFlight<T, E>
where
    T: Send + Sync + 'static,
    E: Clone + Send + Sync + From<CacheError> + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of computations currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.lock().contains_key(key)
    }

    /// Join the computation for `key`, starting it with `compute` if none is running.
    ///
    /// `compute` is only invoked by the leader, and is invoked while the admission
    /// lock is held, so it should just build the future.
    pub fn admit<F, Fut>(&self, key: &str, compute: F) -> (Flight<T, E>, FlightRole)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mut table = self.in_flight.lock();
        if let Some(existing) = table.get(key) {
            debug!(key, "Joining in-flight computation");
            return (existing.clone(), FlightRole::Follower);
        }

        let guard = FlightGuard {
            table: Arc::clone(&self.in_flight),
            key: key.to_string(),
        };
        let work = compute();
        let task = tokio::spawn(
            async move {
                let result = work.await.map(Arc::new);
                drop(guard);
                result
            }
            .with_current_subscriber(),
        );

        let owned_key = key.to_string();
        let flight: Flight<T, E> = async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => Err(E::from(CacheError::ComputationAborted {
                    key: owned_key,
                    message: join_error.to_string(),
                })),
            }
        }
        .boxed()
        .shared();

        table.insert(key.to_string(), flight.clone());
        debug!(key, in_flight = table.len(), "Started computation");
        (flight, FlightRole::Leader)
    }

    /// Admit and wait for the result
    pub async fn run<F, Fut>(&self, key: &str, compute: F) -> (Result<Arc<T>, E>, FlightRole)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (flight, role) = self.admit(key, compute);
        (flight.await, role)
    }
}

impl<T, E> Default for SingleFlight<T, E>
where
    T: Send + Sync + 'static,
    E: Clone + Send + Sync + From<CacheError> + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestError {
        Failed(String),
        Cache(CacheError),
    }

    impl From<CacheError> for TestError {
        fn from(err: CacheError) -> Self {
            TestError::Cache(err)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_computation() {
        let flights: Arc<SingleFlight<u32, TestError>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flights = Arc::clone(&flights);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                flights
                    .run("key", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(7)
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let leaders = results
            .iter()
            .filter(|(_, role)| *role == FlightRole::Leader)
            .count();
        assert_eq!(leaders, 1);

        let first = results[0].0.clone().unwrap();
        for (result, _) in &results {
            assert!(Arc::ptr_eq(&first, result.as_ref().unwrap()));
        }
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let flights: SingleFlight<String, TestError> = SingleFlight::new();
        let (a, role_a) = flights.run("a", || async { Ok("a".to_string()) }).await;
        let (b, role_b) = flights.run("b", || async { Ok("b".to_string()) }).await;

        assert_eq!(role_a, FlightRole::Leader);
        assert_eq!(role_b, FlightRole::Leader);
        assert_eq!(a.unwrap().as_str(), "a");
        assert_eq!(b.unwrap().as_str(), "b");
    }

    #[tokio::test]
    async fn test_error_reaches_every_waiter_and_clears_key() {
        let flights: Arc<SingleFlight<u32, TestError>> = Arc::new(SingleFlight::new());

        let (leader, _) = flights.admit("key", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(TestError::Failed("boom".to_string()))
        });
        let (follower, role) = flights.admit("key", || async { Ok(1) });
        assert_eq!(role, FlightRole::Follower);

        assert_eq!(leader.await, Err(TestError::Failed("boom".to_string())));
        assert_eq!(follower.await, Err(TestError::Failed("boom".to_string())));
        assert!(!flights.is_in_flight("key"));

        let (retry, role) = flights.run("key", || async { Ok(2) }).await;
        assert_eq!(role, FlightRole::Leader);
        assert_eq!(*retry.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_panicking_computation_is_reported_and_cleared() {
        let flights: SingleFlight<u32, TestError> = SingleFlight::new();
        let (result, _) = flights
            .run("key", || async {
                if true {
                    panic!("computation panicked");
                }
                Ok(0)
            })
            .await;

        assert!(matches!(
            result,
            Err(TestError::Cache(CacheError::ComputationAborted { .. }))
        ));
        assert!(!flights.is_in_flight("key"));
    }

    #[tokio::test]
    async fn test_computation_outlives_abandoned_waiter() {
        let flights: SingleFlight<u32, TestError> = SingleFlight::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let marker = Arc::clone(&finished);

        let waited = tokio::time::timeout(
            Duration::from_millis(10),
            flights.run("key", move || async move {
                tokio::time::sleep(Duration::from_millis(60)).await;
                marker.fetch_add(1, Ordering::SeqCst);
                Ok(3)
            }),
        )
        .await;
        assert!(waited.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(!flights.is_in_flight("key"));
    }
}
