//! Storage port behind the result cache, plus the in-memory backend

use std::{
    collections::HashMap,
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// A stored result together with its lifetime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// Fingerprint the entry is addressed by
    pub key: String,
    pub data: T,
    pub created_at: SystemTime,
    /// `None` keeps the entry until it is invalidated
    pub expires_at: Option<SystemTime>,
    /// Approximate in-memory size of `data`
    pub size_bytes: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(key: impl Into<String>, data: T, ttl: Option<Duration>, size_bytes: u64) -> Self {
        let created_at = SystemTime::now();
        Self {
            key: key.into(),
            data,
            created_at,
            expires_at: ttl.map(|ttl| created_at + ttl),
            size_bytes,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if SystemTime::now() >= at)
    }

    /// Time left before expiry; `None` when already expired or when there is no TTL
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_at?.duration_since(SystemTime::now()).ok()
    }
}

/// Key-value store the cache is backed by.
///
/// Values cross this boundary as JSON so an out-of-process store can hold
/// them verbatim. Implementations do not interpret expiry; the cache does.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Insert or overwrite
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Returns whether a value was present
    async fn remove(&self, key: &str) -> Result<bool>;

    async fn len(&self) -> Result<usize>;
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }
}
