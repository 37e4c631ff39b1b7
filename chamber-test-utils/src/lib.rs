//! Chamber Test Utilities
//!
//! Centralized test infrastructure for the Chamber workspace:
//! - Counting in-memory source doubles
//! - Latency-injecting source wrapper
//! - Proptest generators for lookup-key traces
//! - Fixtures for the user-directory scenario used across the test suite
//!
//! The backing-call counter lives here, on the double, and not on the
//! caches: the cache contract carries no telemetry, so tests observe
//! source traffic from the source's side.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use chamber_core::Source;

/// Failure reported by [`MockSource`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MockSourceError {
    #[error("key {key} not found")]
    NotFound { key: String },
}

/// In-memory backing source with a read counter.
///
/// Records are fixed at construction; lookups are lock-free and safe for
/// any number of concurrent callers. `reads()` reports how many times the
/// source was reached, which is what the cache-bound tests assert on.
#[derive(Debug)]
pub struct MockSource<T> {
    records: HashMap<String, T>,
    reads: AtomicU64,
}

impl<T> MockSource<T> {
    /// Create an empty source; every lookup fails.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            reads: AtomicU64::new(0),
        }
    }

    /// Create a source holding the given records.
    pub fn with_records(records: impl IntoIterator<Item = (String, T)>) -> Self {
        Self {
            records: records.into_iter().collect(),
            reads: AtomicU64::new(0),
        }
    }

    /// Add a record before the source goes behind a cache.
    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        self.records.insert(key.into(), value);
    }

    /// How many times `get_one` reached this source.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl<T> Default for MockSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> Source for MockSource<T> {
    type Value = T;
    type Error = MockSourceError;

    async fn get_one(&self, key: &str) -> Result<T, MockSourceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| MockSourceError::NotFound {
                key: key.to_string(),
            })
    }
}

/// Source wrapper that delays every lookup by a fixed duration.
///
/// Used to widen the miss window so coalescing tests can arrange genuinely
/// overlapping fetches.
pub struct SlowSource<S> {
    inner: S,
    delay: Duration,
}

impl<S> SlowSource<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Get a reference to the wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Source> Source for SlowSource<S> {
    type Value = S::Value;
    type Error = S::Error;

    async fn get_one(&self, key: &str) -> Result<Self::Value, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_one(key).await
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Minimal record type for directory-style lookup tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    pub id: String,
}

/// The key the seeded sources store `i` under: `user_{i}`.
pub fn user_key(i: usize) -> String {
    format!("user_{i}")
}

/// Seed a [`MockSource`] with users `user_1..=user_{count}`, each holding
/// its own key as its id.
pub fn seeded_user_source(count: usize) -> MockSource<TestUser> {
    MockSource::with_records((1..=count).map(|i| {
        let id = user_key(i);
        (id.clone(), TestUser { id })
    }))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod strategies {
    use super::user_key;
    use proptest::prelude::*;
    use std::ops::Range;

    /// Keys drawn from `user_1..=user_{max_id}`. The small alphabet makes
    /// generated traces revisit keys, which is what exercises the hit path.
    pub fn user_key_strategy(max_id: usize) -> impl Strategy<Value = String> {
        (1..=max_id).prop_map(user_key)
    }

    /// A request trace: a sequence of keys, present and absent mixed.
    pub fn key_trace(max_id: usize, len: Range<usize>) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(user_key_strategy(max_id), len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_source_counts_reads() {
        let source = seeded_user_source(3);

        let user = source.get_one("user_2").await.expect("seeded key resolves");
        assert_eq!(user.id, "user_2");

        let err = source.get_one("user_9").await.unwrap_err();
        assert_eq!(
            err,
            MockSourceError::NotFound {
                key: "user_9".to_string()
            }
        );

        assert_eq!(source.reads(), 2);
    }

    #[tokio::test]
    async fn test_slow_source_delegates() {
        let slow = SlowSource::new(seeded_user_source(1), Duration::from_millis(1));

        let user = slow.get_one("user_1").await.expect("seeded key resolves");
        assert_eq!(user.id, "user_1");
        assert_eq!(slow.inner().reads(), 1);
    }
}
