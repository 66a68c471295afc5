//! Security integration tests: access gate, CORS, and rate limiting

use super::common::*;
use remitlend_backend::config::security::RateLimitConfig;
use serde_json::{json, Value};

const MISCONFIGURED: &str = "Server misconfiguration: INTERNAL_API_KEY is not set";
const UNAUTHORISED: &str = "Unauthorised: invalid or missing API key";

#[tokio::test]
async fn test_protected_route_with_valid_key() {
    let server = TestServer::spawn().await;

    let response = server
        .post_with_key("/api/score/update", json!({ "userId": "GABC", "delta": 10 }), TEST_SECRET)
        .await;

    assert_status(&response, 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_protected_route_without_key() {
    let server = TestServer::spawn().await;

    let response = server.post("/api/score/update", json!({})).await;

    assert_status(&response, 401);
    let body: Value = response.json().await.unwrap();
    assert_error_envelope(&body, UNAUTHORISED);
}

#[tokio::test]
async fn test_protected_route_with_wrong_key() {
    let server = TestServer::spawn().await;

    let response = server
        .post_with_key("/api/score/update", json!({}), "abc124")
        .await;

    assert_status(&response, 401);
    let text = response.text().await.unwrap();
    assert!(!text.contains(TEST_SECRET));
    assert!(!text.contains("abc124"));
}

#[tokio::test]
async fn test_protected_route_with_empty_key() {
    let server = TestServer::spawn().await;

    let response = server.post_with_key("/api/score/update", json!({}), "").await;
    assert_status(&response, 401);
}

#[tokio::test]
async fn test_protected_route_without_secret_configured() {
    let server = TestServer::spawn_with_config(test_config(None)).await;

    // Even a plausible key is refused when the server has nothing to compare against
    let response = server
        .post_with_key("/api/score/update", json!({}), TEST_SECRET)
        .await;

    assert_status(&response, 500);
    let body: Value = response.json().await.unwrap();
    assert_error_envelope(&body, MISCONFIGURED);
}

#[tokio::test]
async fn test_public_score_route_ignores_gate() {
    let server = TestServer::spawn().await;

    let response = server.get("/api/score/user/GABC").await;
    assert_status(&response, 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["userId"], "GABC");
}

#[tokio::test]
async fn test_cors_allowed_origin() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("Origin", TEST_ORIGIN)
        .send()
        .await
        .unwrap();

    assert_status(&response, 200);
    assert_eq!(response.headers()["access-control-allow-origin"], TEST_ORIGIN);
    assert_eq!(response.headers()["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn test_cors_preflight() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/api/simulate"))
        .header("Origin", TEST_ORIGIN)
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], TEST_ORIGIN);
    let methods = response.headers()["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn test_cors_disallowed_origin() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("Origin", "https://evil.example")
        .send()
        .await
        .unwrap();

    assert_status(&response, 403);
    assert!(response.headers().get("access-control-allow-origin").is_none());
    let body: Value = response.json().await.unwrap();
    assert_error_envelope(&body, "Not allowed by CORS");
}

#[tokio::test]
async fn test_no_origin_header_allowed() {
    // Server-to-server callers send no Origin
    let mut config = test_config(Some(TEST_SECRET));
    config.security.cors.allowed_origins.clear();
    let server = TestServer::spawn_with_config(config).await;

    let response = server
        .post_with_key("/api/score/update", json!({}), TEST_SECRET)
        .await;
    assert_status(&response, 200);
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let mut config = test_config(Some(TEST_SECRET));
    config.security.rate_limiting = RateLimitConfig {
        enabled: true,
        requests_per_minute: 1,
        burst_size: 2,
        ..Default::default()
    };
    let server = TestServer::spawn_with_config(config).await;

    let first = server.get("/health").await;
    assert_status(&first, 200);
    assert_eq!(first.headers()["x-ratelimit-limit"], "2");

    assert_status(&server.get("/health").await, 200);

    let limited = server.get("/health").await;
    assert_status(&limited, 429);
    assert!(limited.headers().contains_key("retry-after"));
    assert_eq!(limited.headers()["x-ratelimit-remaining"], "0");

    let body: Value = limited.json().await.unwrap();
    assert_error_envelope(&body, "Too many requests, please try again later.");
}

#[tokio::test]
async fn test_rate_limit_runs_before_gate() {
    let mut config = test_config(Some(TEST_SECRET));
    config.security.rate_limiting = RateLimitConfig {
        enabled: true,
        requests_per_minute: 1,
        burst_size: 1,
        ..Default::default()
    };
    let server = TestServer::spawn_with_config(config).await;

    assert_status(&server.post("/api/score/update", json!({})).await, 401);
    // Bucket is empty; the limiter answers before the gate is consulted
    assert_status(&server.post("/api/score/update", json!({})).await, 429);
}

#[tokio::test]
async fn test_repeated_key_header_rejected() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .post(server.url("/api/score/update"))
        .header("x-api-key", TEST_SECRET)
        .header("x-api-key", "wrong")
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_status(&response, 401);
    let body: Value = response.json().await.unwrap();
    assert_error_envelope(&body, UNAUTHORISED);
}
