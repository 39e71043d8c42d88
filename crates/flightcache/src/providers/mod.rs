//! Concrete [`CacheProvider`](crate::CacheProvider) implementations.

mod dummy;
mod memory;
mod null;
mod scoped;

pub use dummy::DummyCacheProvider;
pub use memory::{MemoryCacheConfig, MemoryCacheProvider};
pub use null::NullCacheProvider;
pub use scoped::ScopedCacheProvider;
