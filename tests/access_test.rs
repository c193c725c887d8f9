mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use common::{test_config, TestApp};
use temp_dashboard::build_router;
use temp_dashboard::config::parse_networks;
use temp_dashboard::provisioning::RecordingJobRunner;
use temp_dashboard::repositories::InMemoryEnvironmentRepository;
use temp_dashboard::state::AppState;

const KEY: &str = "dashboard-secret";

async fn app_with_key() -> TestApp {
    let mut config = test_config();
    config.api_key = Some(KEY.to_string());
    TestApp::with_config(config).await
}

#[tokio::test]
async fn test_health_is_open() {
    let app = app_with_key().await;

    let response = app.server.get("/health").await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_api_key_forbidden() {
    let app = app_with_key().await;

    let response = app.server.get("/").await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_wrong_api_key_forbidden() {
    let app = app_with_key().await;

    let response = app
        .server
        .post("/")
        .add_header("x-api-key", "not-the-key")
        .json(&json!({
            "name": "env1",
            "branch": "main",
            "url": "http://x"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(app.jobs.requests().await.is_empty());
    assert!(app.state.environments.scan().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_api_key_allowed() {
    let app = app_with_key().await;

    let response = app.server.get("/").add_header("x-api-key", KEY).await;

    response.assert_status(StatusCode::OK);
    response.assert_json(&json!({ "result": [] }));
}

#[tokio::test]
async fn test_unknown_peer_rejected_when_allow_list_set() {
    let mut config = test_config();
    config.allowed_networks = parse_networks("10.0.0.0/8").unwrap();
    let app = TestApp::with_config(config).await;

    // The mock transport carries no peer address
    let response = app
        .server
        .put("/")
        .json(&json!({
            "id": "abc123",
            "result": "Passed"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

/// Serve the router over a real socket so the peer address reaches the middleware
fn server_with_allow_list(networks: &str) -> TestServer {
    let mut config = test_config();
    config.allowed_networks = parse_networks(networks).unwrap();

    let state = AppState::with_services(
        config,
        Arc::new(InMemoryEnvironmentRepository::new()),
        Arc::new(RecordingJobRunner::new()),
    );
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    TestServer::builder()
        .http_transport()
        .build(app)
        .expect("Failed to create test server")
}

#[tokio::test]
async fn test_peer_inside_allow_list_admitted() {
    let server = server_with_allow_list("127.0.0.0/8");

    let response = server.get("/").await;

    response.assert_status(StatusCode::OK);
    response.assert_json(&json!({ "result": [] }));
}

#[tokio::test]
async fn test_peer_outside_allow_list_rejected() {
    let server = server_with_allow_list("10.0.0.0/8");

    let response = server.get("/").await;

    response.assert_status(StatusCode::FORBIDDEN);

    // Health stays reachable
    server.get("/health").await.assert_status(StatusCode::OK);
}
