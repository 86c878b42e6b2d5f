//! Sliding-window rate limiting.
//!
//! Two interchangeable [`RateLimiter`] implementations share one contract:
//!
//! - [`DistributedRateLimiter`] keeps windows in the shared cache and fails open
//! - [`StandaloneRateLimiter`] keeps windows in process memory
//!
//! Which limits apply is decided outside the limiter, by [`RateCategory`] and
//! the startup-resolved [`RateLimitTable`].

mod distributed;
mod standalone;

pub use distributed::DistributedRateLimiter;
pub use standalone::StandaloneRateLimiter;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Seconds until the client can expect more capacity.
    pub reset_seconds: u64,
}

impl RateDecision {
    pub fn allow(remaining: u32, reset_seconds: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            reset_seconds,
        }
    }

    pub fn reject(reset_seconds: u64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reset_seconds,
        }
    }
}

/// Admission control for `(client, category)` keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Records one request for `key` and decides whether it is admitted.
    ///
    /// A rejected request does not count against the window.
    async fn is_allowed(&self, key: &str, limit: u32, window_seconds: u64) -> RateDecision;

    /// Short name of the implementation, reported by the health check.
    fn variant(&self) -> &'static str;
}

/// Operation classes with independent quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateCategory {
    Create,
    Redirect,
    Stats,
    Default,
}

impl RateCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Redirect => "redirect",
            Self::Stats => "stats",
            Self::Default => "default",
        }
    }

    /// Limiter key for a client in this category.
    pub fn key_for(self, client: &str) -> String {
        format!("{client}:{}", self.as_str())
    }
}

impl fmt::Display for RateCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `limit` requests per `window_seconds` quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRule {
    pub limit: u32,
    pub window_seconds: u64,
}

impl RateRule {
    pub const fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid rate rule '{0}', expected <limit>/<window_seconds>")]
pub struct RateRuleParseError(String);

impl FromStr for RateRule {
    type Err = RateRuleParseError;

    /// Parses `"100/60"` as 100 requests per 60 seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RateRuleParseError(s.to_string());

        let (limit, window) = s.trim().split_once('/').ok_or_else(err)?;
        let limit = limit.trim().parse::<u32>().map_err(|_| err())?;
        let window_seconds = window.trim().parse::<u64>().map_err(|_| err())?;

        if window_seconds == 0 {
            return Err(err());
        }

        Ok(Self::new(limit, window_seconds))
    }
}

impl fmt::Display for RateRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.limit, self.window_seconds)
    }
}

/// Quotas for every [`RateCategory`], fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitTable {
    pub create: RateRule,
    pub redirect: RateRule,
    pub stats: RateRule,
    pub default: RateRule,
}

impl RateLimitTable {
    pub fn rule(&self, category: RateCategory) -> RateRule {
        match category {
            RateCategory::Create => self.create,
            RateCategory::Redirect => self.redirect,
            RateCategory::Stats => self.stats,
            RateCategory::Default => self.default,
        }
    }
}

impl Default for RateLimitTable {
    fn default() -> Self {
        Self {
            create: RateRule::new(100, 60),
            redirect: RateRule::new(1000, 60),
            stats: RateRule::new(200, 60),
            default: RateRule::new(500, 60),
        }
    }
}
