//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_client(max_retries: u32) -> HttpClient {
    let config = HttpClientConfig::builder()
        .max_retries(max_retries)
        .retry_delay(Duration::from_millis(10), Duration::from_millis(50))
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.retry_delay, Duration::from_secs(5));
    assert!(config.rate_limit.is_none());
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .retry_delay(Duration::from_millis(200), Duration::from_secs(1))
        .rate_limit(RateLimiterConfig::per_second(20))
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.retry_delay, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(1));
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(20, 20)));
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_retry_delay_is_capped() {
    let client = fast_client(1);
    assert_eq!(client.retry_delay(None), Duration::from_millis(10));
    assert_eq!(client.retry_delay(Some(120)), Duration::from_millis(50));
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_success_parses_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": 1, "name": "bulbasaur"})),
        )
        .mount(&mock_server)
        .await;

    let client = fast_client(2);
    let url = format!("{}/api/v2/pokemon/1", mock_server.uri());
    let item = client.fetch(&url, &RetryBudget::new(2)).await.unwrap();

    assert_eq!(item["name"], "bulbasaur");
}

#[tokio::test]
async fn test_fetch_retries_429_then_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/4"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 4})))
        .mount(&mock_server)
        .await;

    let client = fast_client(2);
    let budget = RetryBudget::new(2);
    let url = format!("{}/api/v2/pokemon/4", mock_server.uri());
    let item = client.fetch(&url, &budget).await.unwrap();

    assert_eq!(item["id"], 4);
    assert_eq!(budget.used(), 1);
    assert_eq!(request_count(&mock_server).await, 2);
}

#[tokio::test]
async fn test_fetch_429_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = fast_client(3);
    let url = format!("{}/api/v2/pokemon", mock_server.uri());
    let err = client.fetch(&url, &RetryBudget::new(3)).await.unwrap_err();

    assert!(matches!(err, Error::TooManyRequests { retries: 3, .. }));
    // Initial attempt plus three retries, never a fifth call
    assert_eq!(request_count(&mock_server).await, 4);
}

#[tokio::test]
async fn test_fetch_shared_budget_drains_across_urls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = fast_client(1);
    let budget = RetryBudget::new(1);

    let first = client
        .fetch(&format!("{}/a", mock_server.uri()), &budget)
        .await;
    let second = client
        .fetch(&format!("{}/b", mock_server.uri()), &budget)
        .await;

    assert!(first.unwrap_err().is_rate_limited());
    assert!(second.unwrap_err().is_rate_limited());
    // /a: 2 requests, /b: 1 request because the shared budget is spent
    assert_eq!(request_count(&mock_server).await, 3);
}

#[tokio::test]
async fn test_fetch_hard_failure_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = fast_client(3);
    let url = format!("{}/api/v2/pokemon/9999", mock_server.uri());
    let budget = RetryBudget::new(3);
    let err = client.fetch(&url, &budget).await.unwrap_err();

    assert!(matches!(err, Error::RequestFailed { .. }));
    assert!(err.to_string().contains("HTTP 500"));
    assert_eq!(budget.used(), 0);
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_fetch_invalid_json_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = fast_client(0);
    let err = client.get_json(&mock_server.uri()).await.unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_fetch_invalid_url() {
    let client = fast_client(0);
    let err = client.get_json("not a url").await.unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .timeout(Duration::from_millis(50))
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(config).unwrap();
    let err = client.get_json(&mock_server.uri()).await.unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 50, .. }));
}

// ============================================================================
// PUT Tests
// ============================================================================

#[tokio::test]
async fn test_put_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/cache/data/pokemon"))
        .and(body_json(serde_json::json!({"id": 1, "name": "bulbasaur"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(0);
    let url = format!("{}/cache/data/pokemon", mock_server.uri());
    let response = client
        .put_json(&url, &serde_json::json!({"id": 1, "name": "bulbasaur"}))
        .await
        .unwrap();

    assert_eq!(response["id"], "1");
}

#[tokio::test]
async fn test_put_json_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "down"})))
        .mount(&mock_server)
        .await;

    let client = fast_client(0);
    let err = client
        .put_json(&mock_server.uri(), &serde_json::json!({"id": 1}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("HTTP 500"));
}
