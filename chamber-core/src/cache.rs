//! Baseline read-through cache.
//!
//! Serves repeated lookups for a key from memory after the first
//! successful fetch. The store is a `HashMap` behind a readers-writer
//! lock: lookups take the shared read lock and never block each other,
//! only a store-on-miss takes the exclusive write lock.
//!
//! # Duplicate-fetch policy
//!
//! The check-then-fetch-then-store sequence is deliberately not atomic as
//! a whole. Between one caller's miss and its store, other callers for the
//! same key may also miss and also reach the source, so the source can be
//! invoked more than once per key under concurrent cold load. What is
//! guaranteed: once any successful result for a key has been stored, every
//! later `get_one` for that key is served from the store with no further
//! source call. Callers that need the tighter exactly-once bound use
//! [`SingleFlightCache`](crate::SingleFlightCache) instead.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::source::Source;

/// Read-through cache over a [`Source`].
///
/// On hit, returns a clone of the stored value. On miss, fetches from the
/// wrapped source with no lock held, stores a successful result, and
/// returns it. Failures pass through verbatim and are never stored, so a
/// failed key is retried on every call (no negative caching).
///
/// Entries live for the lifetime of the cache: no eviction, no expiry.
///
/// # Example
///
/// ```ignore
/// let cache = ReadThroughCache::new(user_service);
///
/// // First call reaches the service, second is served from memory.
/// let user = cache.get_one("user_42").await?;
/// let same = cache.get_one("user_42").await?;
/// ```
pub struct ReadThroughCache<S: Source> {
    /// The backing source; read-only after construction, never replaced.
    source: S,
    /// The store. Exclusively owned; the write lock is held only for the
    /// insert itself, never across a source call.
    entries: RwLock<HashMap<String, S::Value>>,
}

impl<S: Source> ReadThroughCache<S> {
    /// Create a cache wrapping `source`, with an empty store.
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a reference to the wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve `key`, from the store if warm, otherwise through the source.
    pub async fn get_one(&self, key: &str) -> Result<S::Value, S::Error> {
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        // No lock is held here: a slow source call must not block
        // unrelated lookups. Racing misses for the same key may each
        // reach the source; last store wins, which is immaterial when
        // the source is consistent per key.
        let value = self.source.get_one(key).await?;
        self.store(key, value.clone()).await;
        Ok(value)
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Whether `key` has a stored value.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    async fn lookup(&self, key: &str) -> Option<S::Value> {
        self.entries.read().await.get(key).cloned()
    }

    async fn store(&self, key: &str, value: S::Value) {
        self.entries.write().await.insert(key.to_string(), value);
    }
}

impl<S: Source + Default> Default for ReadThroughCache<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// The cache has the same shape as the capability it wraps, making it a
/// drop-in decorator over any source.
#[async_trait]
impl<S: Source> Source for ReadThroughCache<S> {
    type Value = S::Value;
    type Error = S::Error;

    async fn get_one(&self, key: &str) -> Result<Self::Value, Self::Error> {
        ReadThroughCache::get_one(self, key).await
    }
}
