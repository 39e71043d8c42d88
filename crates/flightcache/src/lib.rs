//! In-process caching with stampede prevention.
//!
//! The central type is [`LockedCache`], which wraps any [`CacheProvider`] and makes sure that
//! concurrent requests for the same missing key collapse into a single computation. Every caller
//! that observed the miss while that computation was in flight receives the same outcome, be it a
//! value, the absence of a value, or the very same error.
//!
//! ```
//! use flightcache::{CachableResult, CachingParameters, LockedCache, MemoryCacheProvider};
//!
//! let cache = LockedCache::new(MemoryCacheProvider::default());
//!
//! let answer = cache
//!     .get("answer", || {
//!         Ok(Some(CachableResult::new(
//!             42u32,
//!             CachingParameters::from_minutes(1),
//!         )))
//!     })
//!     .unwrap();
//! assert_eq!(answer, Some(42));
//! ```
//!
//! The storage itself is pluggable: [`MemoryCacheProvider`] keeps entries in memory with
//! absolute or sliding expiration, [`NullCacheProvider`] stores nothing,
//! [`DummyCacheProvider`] keeps everything forever and [`ScopedCacheProvider`] keeps entries
//! only for the duration of a request scope.

#[macro_use]
pub mod metrics;

pub mod config;
mod error;
pub mod keys;
mod locking;
pub mod logging;
mod parameters;
mod provider;
mod providers;

pub use error::CacheError;
pub use keys::{Cachable, CacheKeyBuilder, CacheKeyProvider};
pub use locking::{ComputationGuard, LockRegistry, LockedCache};
pub use parameters::{CachableResult, CachePriority, CachingParameters};
pub use provider::{CacheProvider, CacheValue};
pub use providers::{
    DummyCacheProvider, MemoryCacheConfig, MemoryCacheProvider, NullCacheProvider,
    ScopedCacheProvider,
};
