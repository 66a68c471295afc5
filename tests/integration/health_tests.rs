//! Built-in endpoint tests: `/`, `/health`, docs, and the 404 fallback

use super::common::*;
use serde_json::Value;

#[tokio::test]
async fn test_root_reports_running() {
    let server = TestServer::spawn().await;

    let response = server.get("/").await;
    assert_status(&response, 200);
    assert_eq!(response.text().await.unwrap(), "RemitLend Backend is running");
}

#[tokio::test]
async fn test_health_shape() {
    let server = TestServer::spawn().await;

    let response = server.get("/health").await;
    assert_status(&response, 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_health_without_secret_configured() {
    // Public endpoints keep working when the gate is misconfigured
    let server = TestServer::spawn_with_config(test_config(None)).await;

    assert_status(&server.get("/health").await, 200);
    assert_status(&server.get("/api/score/user/GABC").await, 200);
}

#[tokio::test]
async fn test_unknown_route_returns_envelope() {
    let server = TestServer::spawn().await;

    let response = server.get("/api/does-not-exist").await;
    assert_status(&response, 404);

    let body: Value = response.json().await.unwrap();
    assert_error_envelope(&body, "Route not found");
}

#[tokio::test]
async fn test_simulation_mount() {
    let server = TestServer::spawn().await;

    let response = server
        .post("/api/simulate", serde_json::json!({ "amount": 500 }))
        .await;
    assert_status(&response, 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["request"]["amount"], 500);
}

#[tokio::test]
async fn test_docs_ui_and_document() {
    let server = TestServer::spawn().await;

    let ui = server.get("/api/docs").await;
    assert_status(&ui, 200);
    assert!(ui.text().await.unwrap().contains("swagger-ui"));

    let doc = server.get("/api/docs/openapi.json").await;
    assert_status(&doc, 200);

    let body: Value = doc.json().await.unwrap();
    assert_eq!(body["openapi"], "3.0.3");
    assert!(body["paths"]["/health"]["get"].is_object());
    assert!(body["paths"]["/api/simulate"]["post"].is_object());
    assert!(body["paths"]["/api/score/{user_id}"]["get"].is_object());
    assert!(body["paths"]["/api/score/update"]["post"]["security"].is_array());
    assert!(body["components"]["securitySchemes"]["ApiKeyAuth"].is_object());
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();

    assert_status(&response, 200);
    assert_eq!(response.headers()["x-request-id"], "req-42");
}
