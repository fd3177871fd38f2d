//! Hit, miss and single-flight counters for a result cache

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

/// Point-in-time copy of the cache counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from storage
    pub hits: u64,
    /// Lookups that found no usable entry
    pub misses: u64,
    /// Misses that attached to a computation already in flight
    pub joins: u64,
    /// Computations actually started
    pub computations: u64,
    /// Entries written to storage
    pub stores: u64,
    /// Writes or reads the backing store rejected
    pub storage_failures: u64,
    /// Entries dropped because their TTL elapsed
    pub invalidations: u64,
    /// Size in bytes of the most recently stored entry
    pub last_entry_size_bytes: u64,
    /// Summed time spent answering hits, in microseconds
    pub hit_time_us: u64,
    /// Summed time spent writing entries, in microseconds
    pub store_time_us: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups served from storage, `0.0` before the first lookup
    pub fn hit_ratio(&self) -> f64 {
        ratio(self.hits, self.lookups())
    }

    /// Fraction of misses that were served by a computation already in flight
    pub fn join_ratio(&self) -> f64 {
        ratio(self.joins, self.misses)
    }

    pub fn mean_hit_time(&self) -> Duration {
        mean(self.hit_time_us, self.hits)
    }

    pub fn mean_store_time(&self) -> Duration {
        mean(self.store_time_us, self.stores)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lookups ({} hits, {:.1}%), {} computed, {} joined, {} stored, {} expired, {} storage failures",
            self.lookups(),
            self.hits,
            self.hit_ratio() * 100.0,
            self.computations,
            self.joins,
            self.stores,
            self.invalidations,
            self.storage_failures,
        )
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(total_us: u64, count: u64) -> Duration {
    if count == 0 {
        Duration::ZERO
    } else {
        Duration::from_micros(total_us / count)
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    joins: AtomicU64,
    computations: AtomicU64,
    stores: AtomicU64,
    storage_failures: AtomicU64,
    invalidations: AtomicU64,
    last_entry_size_bytes: AtomicU64,
    hit_time_us: AtomicU64,
    store_time_us: AtomicU64,
}

/// Shared, lock-free cache counters
///
/// Clones share the same counters, so a clone can be handed to a computation
/// that outlives the lookup that started it.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    counters: Arc<Counters>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self, elapsed: Duration) {
        bump(&self.counters.hits);
        add_micros(&self.counters.hit_time_us, elapsed);
    }

    pub fn record_miss(&self) {
        bump(&self.counters.misses);
    }

    /// A miss that attached to a computation already running
    pub fn record_join(&self) {
        bump(&self.counters.joins);
    }

    /// A miss that started a computation
    pub fn record_computation(&self) {
        bump(&self.counters.computations);
    }

    pub fn record_store(&self, elapsed: Duration, size_bytes: u64) {
        bump(&self.counters.stores);
        add_micros(&self.counters.store_time_us, elapsed);
        self.counters
            .last_entry_size_bytes
            .store(size_bytes, Ordering::Relaxed);
    }

    pub fn record_storage_failure(&self) {
        bump(&self.counters.storage_failures);
    }

    /// An expired entry was dropped on read
    pub fn record_invalidation(&self) {
        bump(&self.counters.invalidations);
    }

    pub fn snapshot(&self) -> CacheStats {
        let c = &*self.counters;
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        CacheStats {
            hits: load(&c.hits),
            misses: load(&c.misses),
            joins: load(&c.joins),
            computations: load(&c.computations),
            stores: load(&c.stores),
            storage_failures: load(&c.storage_failures),
            invalidations: load(&c.invalidations),
            last_entry_size_bytes: load(&c.last_entry_size_bytes),
            hit_time_us: load(&c.hit_time_us),
            store_time_us: load(&c.store_time_us),
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn add_micros(counter: &AtomicU64, elapsed: Duration) {
    let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    counter.fetch_add(micros, Ordering::Relaxed);
}

/// Measures one cache operation
#[derive(Debug)]
pub struct OperationTimer {
    started: Instant,
}

impl OperationTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
