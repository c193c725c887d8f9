use std::sync::Arc;

use axum_test::TestServer;
use temp_dashboard::build_router;
use temp_dashboard::config::{Config, JobRunnerKind, StoreBackend};
use temp_dashboard::provisioning::RecordingJobRunner;
use temp_dashboard::repositories::InMemoryEnvironmentRepository;
use temp_dashboard::state::AppState;

/// Test configuration
pub fn test_config() -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        database_url: None,
        job_runner: JobRunnerKind::Command,
        build_service_url: None,
        create_database_command: "true".to_string(),
        create_stack_command: "true".to_string(),
        delete_stack_command: "true".to_string(),
        job_timeout_seconds: 5,
        job_poll_interval_seconds: 1,
        api_key: None,
        allowed_networks: Vec::new(),
        cors_allow_origin: "*".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        log_json: false,
    }
}

/// Test application wrapper
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub jobs: RecordingJobRunner,
}

#[allow(dead_code)]
impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test application with a custom configuration
    pub async fn with_config(config: Config) -> Self {
        // In-memory store and recording job runner (no database or build service in tests)
        let environments = Arc::new(InMemoryEnvironmentRepository::new());
        let jobs = RecordingJobRunner::new();

        let state = AppState::with_services(config, environments, Arc::new(jobs.clone()));

        let router = build_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            state,
            jobs,
        }
    }
}
