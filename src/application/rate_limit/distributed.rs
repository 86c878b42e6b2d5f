//! Rate limiter backed by sorted sets in the shared cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use super::{RateDecision, RateLimiter};
use crate::infrastructure::cache::{CacheError, CacheService, RATE_LIMIT_PREFIX};

/// Sliding-window limiter shared by every instance using the same cache.
///
/// Each key is a sorted set of request timestamps in milliseconds. Any cache
/// failure or timeout admits the request with `remaining = limit`.
pub struct DistributedRateLimiter {
    backend: Arc<dyn CacheService>,
    op_timeout: Duration,
}

impl DistributedRateLimiter {
    pub fn new(backend: Arc<dyn CacheService>, op_timeout: Duration) -> Self {
        Self {
            backend,
            op_timeout,
        }
    }

    fn fail_open(key: &str, limit: u32, window_seconds: u64, reason: &str) -> RateDecision {
        warn!(key, reason, "Rate limit backend degraded, failing open");
        metrics::counter!("rate_limit_fail_open_total").increment(1);
        RateDecision::allow(limit, window_seconds)
    }
}

#[async_trait]
impl RateLimiter for DistributedRateLimiter {
    async fn is_allowed(&self, key: &str, limit: u32, window_seconds: u64) -> RateDecision {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = i64::try_from(window_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        let cache_key = format!("{RATE_LIMIT_PREFIX}{key}");
        // Unique per request so concurrent hits in the same millisecond all count.
        let member = format!("{now_ms}-{:016x}", rand::random::<u64>());

        let recorded = tokio::time::timeout(
            self.op_timeout,
            self.backend.window_record(
                &cache_key,
                &member,
                now_ms,
                now_ms.saturating_sub(window_ms),
                window_seconds,
            ),
        )
        .await;

        let count = match recorded {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => return Self::fail_open(key, limit, window_seconds, &e.to_string()),
            Err(_) => {
                let reason = CacheError::Timeout.to_string();
                return Self::fail_open(key, limit, window_seconds, &reason);
            }
        };

        if count > u64::from(limit) {
            match tokio::time::timeout(
                self.op_timeout,
                self.backend.window_remove(&cache_key, &member),
            )
            .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(key, error = %e, "Failed to withdraw rejected request"),
                Err(_) => warn!(key, "Timed out withdrawing rejected request"),
            }
            return RateDecision::reject(window_seconds);
        }

        let remaining = u32::try_from(u64::from(limit) - count).unwrap_or(0);
        RateDecision::allow(remaining, window_seconds)
    }

    fn variant(&self) -> &'static str {
        "distributed"
    }
}
