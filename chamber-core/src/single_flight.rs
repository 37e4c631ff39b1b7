//! Single-flight read-through cache.
//!
//! Same contract as [`ReadThroughCache`](crate::ReadThroughCache), with a
//! tighter cold-miss bound: concurrent misses for the same key coalesce
//! onto one outstanding source call instead of racing.
//!
//! # Mechanism
//!
//! Each key in flight has a gate, an `Arc<Mutex<()>>` registered in the
//! `in_flight` map. A miss acquires its key's gate, re-checks the store
//! (another flight may have completed while it waited), and only then
//! fetches. The gate holder stores a successful result and retires the
//! gate; waiters wake to a warm store and return without touching the
//! source. A failed fetch retires nothing and stores nothing: waiters
//! behind it retry the source themselves, one at a time, so a missing key
//! fails every caller without ever producing a thundering herd.
//!
//! # Lock order
//!
//! The `in_flight` guard is held only to clone or remove a gate handle,
//! never while awaiting a gate or the source. Gates for keys that have
//! never resolved stay registered so retries remain serialized.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::source::Source;

/// Read-through cache with exactly-once fetches for present keys.
///
/// For M distinct keys the source can resolve, any amount of concurrent
/// traffic produces exactly M source calls, cold or warm. Failures pass
/// through verbatim and are never stored, exactly as in the baseline
/// cache.
pub struct SingleFlightCache<S: Source> {
    source: S,
    entries: RwLock<HashMap<String, S::Value>>,
    /// Per-key gates for misses currently being resolved.
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Source> SingleFlightCache<S> {
    /// Create a cache wrapping `source`, with an empty store.
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get a reference to the wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve `key`, joining an outstanding fetch for it if one exists.
    pub async fn get_one(&self, key: &str) -> Result<S::Value, S::Error> {
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        let gate = self.gate_for(key).await;
        let _held = gate.lock().await;

        // A flight that held the gate before us may have warmed the store.
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        let value = self.source.get_one(key).await?;
        self.store(key, value.clone()).await;
        self.retire_gate(key).await;
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

    async fn gate_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        Arc::clone(in_flight.entry(key.to_string()).or_default())
    }

    async fn retire_gate(&self, key: &str) {
        self.in_flight.lock().await.remove(key);
    }

    /// Number of gates currently registered. Test-only observability.
    #[doc(hidden)]
    pub async fn gates_registered(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

impl<S: Source + Default> Default for SingleFlightCache<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// Drop-in decorator over any source, same as the baseline cache.
#[async_trait]
impl<S: Source> Source for SingleFlightCache<S> {
    type Value = S::Value;
    type Error = S::Error;

    async fn get_one(&self, key: &str) -> Result<Self::Value, Self::Error> {
        SingleFlightCache::get_one(self, key).await
    }
}
