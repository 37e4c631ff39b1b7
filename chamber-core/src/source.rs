//! The lookup capability that caches wrap.
//!
//! A [`Source`] is anything that can resolve a string key to a value:
//! a database client, an HTTP directory, another cache. Caches in this
//! crate are decorators over a `Source` and implement `Source` themselves,
//! so they can be dropped in anywhere the backing capability is expected
//! (including in front of each other).

use std::sync::Arc;

use async_trait::async_trait;

/// A keyed lookup capability.
///
/// Implementations must be safe to call concurrently from any number of
/// callers without external synchronization; the caches in this crate
/// provide none around their source. Under concurrent cold misses a
/// source may be asked for the same key more than once (see
/// [`ReadThroughCache`](crate::ReadThroughCache) for the exact policy).
///
/// # Implementation Requirements
///
/// - `Value` must be `Clone`: the cache retains the stored value and hands
///   out copies. Wrap expensive values in `Arc` to make cloning cheap.
/// - `Error` is entirely the source's own; caches return it verbatim and
///   define no failure kinds of their own.
#[async_trait]
pub trait Source: Send + Sync {
    /// The value a key resolves to.
    type Value: Clone + Send + Sync;

    /// The failure reported when a key cannot be resolved.
    type Error: Send;

    /// Resolve a single key to its value.
    async fn get_one(&self, key: &str) -> Result<Self::Value, Self::Error>;
}

/// A shared handle is itself a source, so callers can keep their own
/// reference to a backing service while a cache owns another.
#[async_trait]
impl<S: Source + ?Sized> Source for Arc<S> {
    type Value = S::Value;
    type Error = S::Error;

    async fn get_one(&self, key: &str) -> Result<Self::Value, Self::Error> {
        (**self).get_one(key).await
    }
}
