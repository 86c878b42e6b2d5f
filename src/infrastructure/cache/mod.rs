//! Caching layer for fast redirects and deduplication.
//!
//! - [`CacheService`] - raw backend trait, implemented by [`RedisCache`]
//! - [`VolatileCache`] - best-effort facade that never propagates backend failures;
//!   with no backend ([`CacheHandle::Unavailable`]) every read misses

mod redis_cache;
mod service;
mod volatile;

pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};
pub use volatile::{
    CacheHandle, CacheSettings, DEDUP_PREFIX, RATE_LIMIT_PREFIX, URL_PREFIX, VolatileCache,
};

#[cfg(test)]
pub use service::MockCacheService;
