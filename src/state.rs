use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database};
use sqlx::postgres::PgPool;

use crate::config::{Config, JobRunnerKind, StoreBackend};
use crate::provisioning::{CommandJobRunner, HttpJobRunner, JobRunner};
use crate::repositories::{
    EnvironmentRepository, InMemoryEnvironmentRepository, SeaOrmEnvironmentRepository,
};
use crate::workflow::{CreateWorkflow, DeleteWorkflow, WorkflowEngine};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Record store for environment records
    pub environments: Arc<dyn EnvironmentRepository>,
    pub create_workflow: CreateWorkflow,
    pub delete_workflow: DeleteWorkflow,
}

impl AppState {
    /// Create a new AppState by connecting the configured backends
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        let environments: Arc<dyn EnvironmentRepository> = match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| AppStateError::Postgres("DATABASE_URL not set".to_string()))?;
                Arc::new(connect_postgres(database_url).await?)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory record store; records are lost on restart");
                Arc::new(InMemoryEnvironmentRepository::new())
            }
        };

        let jobs: Arc<dyn JobRunner> = match config.job_runner {
            JobRunnerKind::Command => Arc::new(CommandJobRunner::from_config(&config)),
            JobRunnerKind::Http => {
                let base_url = config.build_service_url.clone().ok_or_else(|| {
                    AppStateError::JobRunner("BUILD_SERVICE_URL not set".to_string())
                })?;
                let runner = HttpJobRunner::new(
                    base_url,
                    Duration::from_secs(config.job_poll_interval_seconds),
                )
                .map_err(|e| AppStateError::JobRunner(e.to_string()))?;
                Arc::new(runner)
            }
        };

        Ok(Self::with_services(config, environments, jobs))
    }

    /// Create AppState from already built services (used by tests)
    pub fn with_services(
        config: Config,
        environments: Arc<dyn EnvironmentRepository>,
        jobs: Arc<dyn JobRunner>,
    ) -> Self {
        let engine = Arc::new(WorkflowEngine::new(
            environments.clone(),
            jobs,
            Duration::from_secs(config.job_timeout_seconds),
        ));

        Self {
            config,
            environments,
            create_workflow: CreateWorkflow::new(engine.clone()),
            delete_workflow: DeleteWorkflow::new(engine),
        }
    }
}

/// Run migrations and open the SeaORM record store
pub async fn connect_postgres(database_url: &str) -> Result<SeaOrmEnvironmentRepository, AppStateError> {
    // Connect to PostgreSQL with SQLx (for migrations)
    let pg_pool = PgPool::connect(database_url)
        .await
        .map_err(|e| AppStateError::Postgres(e.to_string()))?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .map_err(|e| AppStateError::Migration(e.to_string()))?;
    pg_pool.close().await;

    // Connect to PostgreSQL with SeaORM
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(20)
        .min_connections(2)
        .sqlx_logging(true);

    let db = Database::connect(opt)
        .await
        .map_err(|e| AppStateError::Postgres(e.to_string()))?;

    Ok(SeaOrmEnvironmentRepository::new(db))
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("PostgreSQL connection error: {0}")]
    Postgres(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Job runner error: {0}")]
    JobRunner(String),
}
