//! In-process sliding-window rate limiter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::{RateDecision, RateLimiter};

type Windows = Mutex<HashMap<String, Vec<Instant>>>;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

/// Sliding-window limiter holding timestamps in process memory.
///
/// One lock guards the whole key map and is never held across an await.
/// A background sweep, started exactly once on first use, drops timestamps
/// older than the retention period so abandoned keys do not accumulate.
pub struct StandaloneRateLimiter {
    windows: Arc<Windows>,
    sweeper: OnceLock<JoinHandle<()>>,
    sweep_interval: Duration,
    retention: Duration,
}

impl StandaloneRateLimiter {
    pub fn new() -> Self {
        Self::with_sweep(DEFAULT_SWEEP_INTERVAL, DEFAULT_RETENTION)
    }

    pub fn with_sweep(sweep_interval: Duration, retention: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            sweeper: OnceLock::new(),
            sweep_interval,
            retention,
        }
    }

    /// Number of keys currently holding timestamps.
    pub fn tracked_keys(&self) -> usize {
        lock(&self.windows).len()
    }

    pub fn sweeper_started(&self) -> bool {
        self.sweeper.get().is_some()
    }

    fn ensure_sweeper(&self) {
        self.sweeper.get_or_init(|| {
            debug!("Starting rate limit sweeper");
            tokio::spawn(sweep_loop(
                Arc::downgrade(&self.windows),
                self.sweep_interval,
                self.retention,
            ))
        });
    }

    fn check(&self, key: &str, limit: u32, window: Duration, now: Instant) -> RateDecision {
        let mut windows = lock(&self.windows);
        let timestamps = windows.entry(key.to_string()).or_default();

        timestamps.retain(|&t| now.duration_since(t) < window);

        if timestamps.len() >= limit as usize {
            let reset = timestamps
                .first()
                .map(|&oldest| (oldest + window).saturating_duration_since(now))
                .unwrap_or(window);
            return RateDecision::reject(ceil_seconds(reset).max(1));
        }

        timestamps.push(now);
        let remaining = limit.saturating_sub(timestamps.len() as u32);

        RateDecision::allow(remaining, window.as_secs())
    }
}

impl Default for StandaloneRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StandaloneRateLimiter {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get() {
            handle.abort();
        }
    }
}

#[async_trait]
impl RateLimiter for StandaloneRateLimiter {
    async fn is_allowed(&self, key: &str, limit: u32, window_seconds: u64) -> RateDecision {
        self.ensure_sweeper();
        self.check(
            key,
            limit,
            Duration::from_secs(window_seconds),
            Instant::now(),
        )
    }

    fn variant(&self) -> &'static str {
        "standalone"
    }
}

/// Locks the window map, recovering from a poisoned lock.
fn lock(windows: &Windows) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
    windows.lock().unwrap_or_else(|poisoned| {
        warn!("Rate limit state lock was poisoned, recovering");
        windows.clear_poison();
        poisoned.into_inner()
    })
}

fn ceil_seconds(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

async fn sweep_loop(windows: Weak<Windows>, every: Duration, retention: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(windows) = windows.upgrade() else {
            break;
        };

        let removed = sweep(&windows, retention, Instant::now());
        if removed > 0 {
            debug!(removed, "Swept idle rate limit keys");
        }
    }
}

/// Prunes timestamps older than `retention` and drops emptied keys.
///
/// Returns how many keys were dropped.
fn sweep(windows: &Windows, retention: Duration, now: Instant) -> usize {
    let mut windows = lock(windows);
    let before = windows.len();

    windows.retain(|_, timestamps| {
        timestamps.retain(|&t| now.duration_since(t) < retention);
        !timestamps.is_empty()
    });

    before - windows.len()
}
