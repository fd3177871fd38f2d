//! # wordforge cache
//!
//! Content-addressed result cache for the generation engine.
//!
//! ## Features
//!
//! - **Pluggable storage**: an async key-value port with an in-memory backend
//! - **TTL expiry**: entries are recomputed on first access after they expire
//! - **Single-flight**: at most one concurrent computation per key, shared by every waiter
//! - **Metrics**: hits, misses, joins, computations and timing

pub mod cache;
pub mod error;
pub mod metrics;
pub mod single_flight;
pub mod storage;

pub use cache::{CacheConfig, CacheLookup, Cacheable, LookupSource, ResultCache};
pub use error::CacheError;
pub use metrics::{CacheMetrics, CacheStats, OperationTimer};
pub use single_flight::{FlightRole, SingleFlight};
pub use storage::{CacheEntry, CacheStorage, MemoryStorage};

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, CacheError>;
