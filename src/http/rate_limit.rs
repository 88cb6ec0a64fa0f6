//! Request pacing
//!
//! A token bucket (governor) in front of every upstream request, so a long
//! walk stays under the fair-use rate instead of collecting 429s.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectGovernor = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Pacing settings: sustained rate plus how many requests may go out at once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed back to back before pacing kicks in
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::per_second(10)
    }
}

impl RateLimiterConfig {
    /// Create a config with an explicit burst
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Pace at `requests_per_second`, bursting up to the same amount
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::new(requests_per_second, requests_per_second)
    }

    /// Zero rates are clamped to one request per second
    fn quota(&self) -> Quota {
        let rate = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN);
        Quota::per_second(rate).allow_burst(burst)
    }
}

/// Shared token bucket; clones draw from the same bucket
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DirectGovernor>,
}

impl RateLimiter {
    /// Create a limiter from `config`
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            bucket: Arc::new(Governor::direct(config.quota())),
        }
    }

    /// Wait for the next request slot
    pub async fn wait(&self) {
        self.bucket.until_ready().await;
    }

    /// Take a slot if one is free right now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
