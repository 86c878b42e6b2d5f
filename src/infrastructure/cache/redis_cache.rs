//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::info;

/// Redis cache backend.
///
/// Uses `ConnectionManager` for connection reuse and transparent reconnects.
/// Commands that belong together are sent as one pipeline.
pub struct RedisCache {
    client: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let cache = Self { client: manager };
        cache.ping().await?;

        info!("✓ Connected to Redis");

        Ok(cache)
    }
}

fn op_error(e: redis::RedisError) -> CacheError {
    CacheError::OperationError(e.to_string())
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();
        conn.get::<_, Option<String>>(key).await.map_err(op_error)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()> {
        let mut conn = self.client.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds.max(1))
            .await
            .map_err(op_error)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();
        conn.del::<_, i64>(key).await.map(|_| ()).map_err(op_error)
    }

    async fn get_many(&self, keys: &[String]) -> CacheResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in keys {
            pipe.get(key);
        }

        let mut conn = self.client.clone();
        pipe.query_async::<Vec<Option<String>>>(&mut conn)
            .await
            .map_err(op_error)
    }

    async fn window_record(
        &self,
        key: &str,
        member: &str,
        score_ms: i64,
        window_start_ms: i64,
        ttl_seconds: u64,
    ) -> CacheResult<u64> {
        let mut conn = self.client.clone();

        let (count,): (u64,) = redis::pipe()
            .zrembyscore(key, 0, window_start_ms)
            .ignore()
            .zadd(key, member, score_ms)
            .ignore()
            .zcard(key)
            .expire(key, ttl_seconds.max(1) as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(op_error)?;

        Ok(count)
    }

    async fn window_remove(&self, key: &str, member: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();
        conn.zrem::<_, _, i64>(key, member)
            .await
            .map(|_| ())
            .map_err(op_error)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.client.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))
    }
}
