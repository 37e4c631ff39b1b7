//! Chamber - concurrency-safe read-through caching.
//!
//! A [`Source`] is any capability that resolves string keys to values.
//! Chamber wraps a source in a cache that serves repeated lookups from
//! memory after the first successful fetch, and stays safe under any
//! number of concurrent callers. Failures are never stored, values are
//! never mutated or evicted, and the source's errors surface verbatim.
//!
//! Two cache types, same contract, different cold-miss policy:
//!
//! - [`ReadThroughCache`]: the baseline. Concurrent misses for one key
//!   may each reach the source (at-least-once per miss window), trading
//!   duplicate fetches for zero coordination on the miss path.
//! - [`SingleFlightCache`]: concurrent misses for one key coalesce onto a
//!   single outstanding source call (exactly-once per present key).
//!
//! Both caches implement `Source` themselves, so they are drop-in
//! decorators over any source-shaped capability.
//!
//! # Example
//!
//! ```ignore
//! let directory = ReadThroughCache::new(user_service);
//!
//! // Cold: reaches the service. Warm: served from memory.
//! let user = directory.get_one("user_17").await?;
//! let user = directory.get_one("user_17").await?;
//! ```

pub mod cache;
pub mod single_flight;
pub mod source;

pub use cache::ReadThroughCache;
pub use single_flight::SingleFlightCache;
pub use source::Source;
