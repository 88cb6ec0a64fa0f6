//! HTTP client module
//!
//! Provides the upstream fetcher and the primitives that keep it polite.
//!
//! # Features
//!
//! - **Rate-limit Retries**: 429 responses retried against an explicit [`RetryBudget`]
//! - **Bounded Concurrency**: [`ConcurrencyLimiter`] caps in-flight requests
//! - **Request Pacing**: Optional token bucket rate limiter using governor

mod client;
mod limiter;
mod rate_limit;
mod retry;

pub use client::{Fetcher, HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use limiter::{limit, ConcurrencyLimiter, Limited};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::RetryBudget;

#[cfg(test)]
mod tests;
