//! Fingerprint-keyed result cache
//!
//! `ResultCache` is the triple of a backing store, an entry TTL and a single-flight
//! table. Lookups read the store first; misses go through the single-flight table,
//! and the leader's computation writes its value back to the store before the key
//! leaves the table.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::metrics::{CacheMetrics, CacheStats, OperationTimer};
use crate::single_flight::{FlightRole, SingleFlight};
use crate::storage::{CacheEntry, CacheStorage};

/// Values the cache can hold
pub trait Cacheable: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Whether this value may be written to storage. Non-cacheable values are
    /// still handed to every waiter of the computation that produced them.
    fn is_cacheable(&self) -> bool {
        true
    }

    /// Approximate in-memory footprint, recorded on the entry
    fn size_hint(&self) -> u64 {
        0
    }
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cache entries
    pub ttl: Option<Duration>,
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Some(Duration::from_secs(60)),
            enable_metrics: true,
        }
    }
}

/// Where a looked-up value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Unexpired entry in storage
    Hit,
    /// This caller ran the computation
    Computed,
    /// This caller waited on another caller's computation
    Joined,
}

impl From<FlightRole> for LookupSource {
    fn from(role: FlightRole) -> Self {
        match role {
            FlightRole::Leader => LookupSource::Computed,
            FlightRole::Follower => LookupSource::Joined,
        }
    }
}

/// Result of `get_or_compute`
#[derive(Debug)]
pub struct CacheLookup<T> {
    pub value: Arc<T>,
    pub source: LookupSource,
    /// This caller's computation wrote its value to storage
    pub stored: bool,
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        self.source == LookupSource::Hit
    }
}

/// Result cache with single-flight computation
pub struct ResultCache<T, E> {
    storage: Arc<dyn CacheStorage>,
    config: CacheConfig,
    metrics: CacheMetrics,
    flights: SingleFlight<T, E>,
}

impl<T, E> ResultCache<T, E>
where
    T: Cacheable,
    E: Clone + Send + Sync + From<CacheError> + 'static,
{
    /// Create a new cache with the default configuration
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self::with_config(storage, CacheConfig::default())
    }

    /// Create a new cache with configuration
    pub fn with_config(storage: Arc<dyn CacheStorage>, config: CacheConfig) -> Self {
        Self {
            storage,
            config,
            metrics: CacheMetrics::new(),
            flights: SingleFlight::new(),
        }
    }

    /// Get cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get cache metrics
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Number of computations currently running
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    /// Read an unexpired value from storage
    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        load_entry(
            self.storage.as_ref(),
            key,
            &self.metrics,
            self.config.enable_metrics,
        )
        .await
    }

    /// Write a value to storage under the configured TTL
    pub async fn put(&self, key: &str, value: &T) -> Result<()> {
        store_entry(
            self.storage.as_ref(),
            key,
            value,
            self.config.ttl,
            &self.metrics,
            self.config.enable_metrics,
        )
        .await
    }

    /// Remove a key from storage
    pub async fn invalidate(&self, key: &str) -> Result<bool> {
        self.storage.remove(key).await
    }

    /// Return the cached value for `key`, or compute it.
    ///
    /// At most one `compute` runs per key at a time; concurrent callers for the
    /// same key wait on it and receive the same `Arc`. A leader re-reads storage
    /// before computing, so a flight that finished between this caller's miss and
    /// its admission is reused rather than repeated. Storage failures degrade to
    /// a miss (on read) or an uncached value (on write).
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        compute: F,
    ) -> std::result::Result<CacheLookup<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let timer = OperationTimer::start();

        match self.get(key).await {
            Ok(Some(value)) => {
                if self.config.enable_metrics {
                    self.metrics.record_hit(timer.elapsed());
                }
                debug!(key, "Cache hit");
                return Ok(CacheLookup {
                    value: Arc::new(value),
                    source: LookupSource::Hit,
                    stored: false,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                if self.config.enable_metrics {
                    self.metrics.record_storage_failure();
                }
            }
        }

        if self.config.enable_metrics {
            self.metrics.record_miss();
        }

        let storage = Arc::clone(&self.storage);
        let metrics = self.metrics.clone();
        let ttl = self.config.ttl;
        let enable_metrics = self.config.enable_metrics;
        let owned_key = key.to_string();
        let reused = Arc::new(AtomicBool::new(false));
        let reused_flag = Arc::clone(&reused);
        let stored = Arc::new(AtomicBool::new(false));
        let stored_flag = Arc::clone(&stored);

        let (flight, role) = self.flights.admit(key, move || {
            // Not polled when the re-read below finds a stored value.
            let work = compute();
            async move {
                if let Ok(Some(stored)) =
                    load_entry(storage.as_ref(), &owned_key, &metrics, enable_metrics).await
                {
                    debug!(key = %owned_key, "Entry stored by an earlier flight, skipping computation");
                    reused_flag.store(true, Ordering::Release);
                    return Ok::<T, E>(stored);
                }

                if enable_metrics {
                    metrics.record_computation();
                }
                let value = work.await?;
                if value.is_cacheable() {
                    // A failed write still hands the value to every waiter.
                    let written = store_entry(
                        storage.as_ref(),
                        &owned_key,
                        &value,
                        ttl,
                        &metrics,
                        enable_metrics,
                    )
                    .await;
                    stored_flag.store(written.is_ok(), Ordering::Release);
                } else {
                    debug!(key = %owned_key, "Computed value is not cacheable, skipping store");
                }
                Ok::<T, E>(value)
            }
        });

        if self.config.enable_metrics && role == FlightRole::Follower {
            self.metrics.record_join();
        }

        let value = flight.await?;
        let leader = role == FlightRole::Leader;
        let source = if leader && reused.load(Ordering::Acquire) {
            LookupSource::Hit
        } else {
            role.into()
        };
        Ok(CacheLookup {
            value,
            source,
            stored: leader && stored.load(Ordering::Acquire),
        })
    }
}

async fn load_entry<T: Cacheable>(
    storage: &dyn CacheStorage,
    key: &str,
    metrics: &CacheMetrics,
    enable_metrics: bool,
) -> Result<Option<T>> {
    let Some(json_value) = storage.get(key).await? else {
        return Ok(None);
    };

    let entry: CacheEntry<T> = match serde_json::from_value(json_value) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(key, error = %e, "Dropping undecodable cache entry");
            let _ = storage.remove(key).await;
            return Ok(None);
        }
    };

    if entry.is_expired() {
        debug!(key, "Cache entry expired");
        let _ = storage.remove(key).await;
        if enable_metrics {
            metrics.record_invalidation();
        }
        return Ok(None);
    }

    Ok(Some(entry.data))
}

async fn store_entry<T: Cacheable>(
    storage: &dyn CacheStorage,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
    metrics: &CacheMetrics,
    enable_metrics: bool,
) -> Result<()> {
    let timer = OperationTimer::start();
    let size_bytes = value.size_hint();
    let entry = CacheEntry::new(key, value, ttl, size_bytes);

    let json_value = serde_json::to_value(&entry).map_err(|e| CacheError::Serialization {
        message: e.to_string(),
    })?;

    if let Err(e) = storage.set(key, json_value).await {
        warn!(key, error = %e, "Cache write failed");
        if enable_metrics {
            metrics.record_storage_failure();
        }
        return Err(e);
    }

    if enable_metrics {
        metrics.record_store(timer.elapsed(), size_bytes);
    }
    debug!(key, size_bytes, "Stored cache entry");
    Ok(())
}
