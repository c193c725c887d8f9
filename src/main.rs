use anyhow::Context;
use tokio::signal;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use temp_dashboard::config::Config;
use temp_dashboard::handlers::{
    CreateEnvironmentRequest, DeleteEnvironmentRequest, EnvironmentListResponse,
    EnvironmentResponse, HealthResponse, StepResponse, UpdateTestResultRequest,
    WorkflowRunResponse,
};
use temp_dashboard::models::EnvStatus;
use temp_dashboard::state::AppState;
use temp_dashboard::{build_router, handlers};

/// Security scheme for the dashboard API key
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                    temp_dashboard::middlewares::API_KEY_HEADER,
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::environment::create_environment,
        handlers::environment::delete_environment,
        handlers::environment::list_environments,
        handlers::environment::update_test_result,
    ),
    components(schemas(
        HealthResponse,
        CreateEnvironmentRequest,
        DeleteEnvironmentRequest,
        UpdateTestResultRequest,
        EnvironmentResponse,
        EnvironmentListResponse,
        EnvStatus,
        StepResponse,
        WorkflowRunResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Environments", description = "Temporary environment lifecycle and dashboard endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let addr = config.server_addr();

    // Initialize application state (record store and job runner)
    tracing::info!(
        store = ?config.store_backend,
        job_runner = ?config.job_runner,
        "Connecting backends..."
    );
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;
    tracing::info!("Backends ready");

    // Build the main application router
    let app = build_router(state)
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
