//! Common test utilities for integration tests
//!
//! Provides test server spawning, stand-in sub-API routers, and assertions.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Path,
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use remitlend_backend::{
    config::{BackendConfig, SharedSecret},
    docs::OperationDoc,
    security::{test_security_config, SecurityState},
    server::{create_router, ApiMounts, AppState},
};

pub const TEST_SECRET: &str = "abc123";
pub const TEST_ORIGIN: &str = "https://app.remitlend.test";

/// Test server wrapper
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawn a test server with the secret and origin configured and
    /// rate limiting off
    pub async fn spawn() -> Self {
        Self::spawn_with_config(test_config(Some(TEST_SECRET))).await
    }

    /// Spawn a test server with custom configuration and stand-in sub-APIs
    pub async fn spawn_with_config(config: BackendConfig) -> Self {
        Self::spawn_with_mounts(config, stub_mounts()).await
    }

    /// Spawn a test server with custom configuration and mounts
    pub async fn spawn_with_mounts(mut config: BackendConfig, mounts: ApiMounts) -> Self {
        // Find an available port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        config.server.host = "127.0.0.1".to_string();
        config.server.port = addr.port();

        let state = AppState::new(config.clone());
        let security = SecurityState::new(&config.security);
        let app = create_router(state, security, mounts);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        let base_url = format!("http://{}", addr);

        // Wait until the listener accepts connections
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Self {
            addr,
            client,
            base_url,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// Send a POST request with JSON body
    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Send a POST request carrying `x-api-key`
    pub async fn post_with_key(&self, path: &str, body: Value, api_key: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Default config with the given secret, one allowed origin, and no rate limit
pub fn test_config(secret: Option<&str>) -> BackendConfig {
    let mut config = BackendConfig::default();
    config.security = test_security_config();
    config.security.api_key.internal_api_key = secret.and_then(SharedSecret::new);
    config.security.cors.allowed_origins = vec![TEST_ORIGIN.to_string()];
    config.telemetry.enabled = false;
    config
}

/// Stand-ins for the simulation and score sub-APIs
pub fn stub_mounts() -> ApiMounts {
    ApiMounts::new()
        .simulation(Router::new().route(
            "/simulate",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "success": true, "request": body }))
            }),
        ))
        .score(Router::new().route(
            "/user/:user_id",
            get(|Path(user_id): Path<String>| async move {
                Json(json!({ "success": true, "userId": user_id, "score": 600 }))
            }),
        ))
        .protected_score(Router::new().route(
            "/update",
            post(|| async { Json(json!({ "success": true })) }),
        ))
        .document(OperationDoc::post("/api/simulate", "Run a loan simulation").with_tag("Simulation"))
        .document(OperationDoc::get("/api/score/:user_id", "Fetch a user's credit score").with_tag("Score"))
        .document(OperationDoc::post("/api/score/update", "Update a user's credit score").with_tag("Score").protected())
}

/// Assert response status
pub fn assert_status(response: &reqwest::Response, expected: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert the `{ success: false, message }` error envelope
pub fn assert_error_envelope(json: &Value, message: &str) {
    assert_eq!(json["success"], Value::Bool(false), "Expected success=false in {:?}", json);
    assert_eq!(json["message"], Value::String(message.to_string()), "Unexpected message in {:?}", json);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_server() {
        let server = TestServer::spawn().await;
        let response = server.get("/health").await;
        assert_eq!(response.status().as_u16(), 200);
    }
}
