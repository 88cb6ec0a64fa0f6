//! HTTP client with rate-limit retry
//!
//! Provides the fetcher used for every upstream request:
//! - 2xx responses are parsed as JSON
//! - 429 responses are retried after a flat, capped delay while the
//!   caller's [`RetryBudget`] lasts
//! - every other failure is terminal for that request

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::retry::RetryBudget;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Performs single logical GETs for pages and items
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and parse its JSON body, retrying rate-limited responses
    /// while `budget` allows.
    async fn fetch(&self, url: &str, budget: &RetryBudget) -> Result<JsonValue>;
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of rate-limit retries for standalone requests
    pub max_retries: u32,
    /// Flat delay before retrying a rate-limited request
    pub retry_delay: Duration,
    /// Upper bound for any retry delay, including `Retry-After`
    pub max_backoff: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
            rate_limit: None,
            user_agent: format!("pokedex-bridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the flat retry delay and its cap
    pub fn retry_delay(mut self, delay: Duration, max: Duration) -> Self {
        self.config.retry_delay = delay;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// GET `url` as JSON with a fresh budget of `max_retries`
    pub async fn get_json(&self, url: &str) -> Result<JsonValue> {
        let budget = RetryBudget::new(self.config.max_retries);
        self.fetch(url, &budget).await
    }

    /// PUT a JSON body, returning the parsed JSON response (null if empty)
    pub async fn put_json<B: Serialize + Sync>(&self, url: &str, body: &B) -> Result<JsonValue> {
        url::Url::parse(url)?;

        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let response = self
            .client
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::request_failed(
                url,
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }

        debug!("Saved data for: {}", url);
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        serde_json::from_str(&text).map_err(|e| Error::malformed(url, e.to_string()))
    }

    /// Delay before retrying a rate-limited response
    pub fn retry_delay(&self, retry_after: Option<u64>) -> Duration {
        let delay = retry_after.map_or(self.config.retry_delay, Duration::from_secs);
        std::cmp::min(delay, self.config.max_backoff)
    }

    fn classify_send_error(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            #[allow(clippy::cast_possible_truncation)]
            return Error::Timeout {
                url: url.to_string(),
                timeout_ms: self.config.timeout.as_millis() as u64,
            };
        }
        Error::request_failed(url, e.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, url: &str, budget: &RetryBudget) -> Result<JsonValue> {
        url::Url::parse(url)?;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| self.classify_send_error(url, e))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if budget.try_consume() {
                    let delay = self.retry_delay(extract_retry_after(&response));
                    warn!(
                        "Too many requests for {}, retry {}/{} in {:?}",
                        url,
                        budget.used(),
                        budget.max_retries(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(Error::TooManyRequests {
                    url: url.to_string(),
                    retries: budget.used(),
                });
            }

            if !status.is_success() {
                return Err(Error::request_failed(
                    url,
                    format!("HTTP {}", status.as_u16()),
                ));
            }

            let body = response
                .text()
                .await
                .map_err(|e| Error::request_failed(url, e.to_string()))?;
            debug!("Got data for: {}", url);
            return serde_json::from_str(&body).map_err(|e| Error::malformed(url, e.to_string()));
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract retry-after header value (seconds)
fn extract_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
