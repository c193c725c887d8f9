use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    sort_by_creation, AttributeUpdate, CreateEnvironment, DeleteEnvironment, EnvStatus,
    EnvironmentRecord, UpdateTestResult,
};
use crate::state::AppState;
use crate::workflow::{WorkflowFailure, WorkflowRun};

/// Body of a test-result update when the record exists
pub const UPDATE_SUCCESS: &str = "Success";
/// Body of a test-result update when the record does not exist (still HTTP 200)
pub const KEY_NOT_FOUND: &str = "Key not found";

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEnvironmentRequest {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub url: Option<String>,
}

impl From<CreateEnvironmentRequest> for CreateEnvironment {
    fn from(r: CreateEnvironmentRequest) -> Self {
        Self {
            name: r.name.unwrap_or_default(),
            branch: r.branch.unwrap_or_default(),
            url: r.url.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteEnvironmentRequest {
    pub id: Option<String>,
    /// Endpoint handed to the teardown job; defaults to the stored url
    pub url: Option<String>,
}

impl From<DeleteEnvironmentRequest> for DeleteEnvironment {
    fn from(r: DeleteEnvironmentRequest) -> Self {
        Self {
            id: r.id.unwrap_or_default(),
            url: r.url,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTestResultRequest {
    pub id: Option<String>,
    /// New end-to-end test outcome, e.g. "Passed" or "Failed"
    pub result: Option<String>,
}

impl From<UpdateTestResultRequest> for UpdateTestResult {
    fn from(r: UpdateTestResultRequest) -> Self {
        Self {
            id: r.id.unwrap_or_default(),
            result: r.result.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentResponse {
    pub id: String,
    pub name: String,
    pub branch: String,
    pub url: String,
    pub env_status: EnvStatus,
    pub e2e: String,
    pub priority: String,
    pub create_data: String,
}

impl From<EnvironmentRecord> for EnvironmentResponse {
    fn from(r: EnvironmentRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            branch: r.branch,
            url: r.url,
            env_status: r.env_status,
            e2e: r.e2e,
            priority: r.priority,
            create_data: r.create_data,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnvironmentListResponse {
    pub result: Vec<EnvironmentResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StepResponse {
    pub step: String,
    pub state: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRunResponse {
    pub execution_id: Uuid,
    pub workflow: String,
    pub id: String,
    pub state: String,
    pub steps: Vec<StepResponse>,
    /// Final record; absent once the record has been removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<EnvironmentResponse>,
}

impl From<WorkflowRun> for WorkflowRunResponse {
    fn from(run: WorkflowRun) -> Self {
        let record = run.state.env_status().map(|_| run.record.clone().into());
        Self {
            execution_id: run.run_id,
            workflow: run.kind.as_str().to_string(),
            id: run.record.id,
            state: run.state.as_str().to_string(),
            steps: run
                .steps
                .iter()
                .map(|s| StepResponse {
                    step: s.step.as_str().to_string(),
                    state: s.state.as_str().to_string(),
                })
                .collect(),
            record,
        }
    }
}

// ============ Handlers ============

/// Start the create workflow for a new temporary environment
#[utoipa::path(
    post,
    path = "/",
    request_body = CreateEnvironmentRequest,
    responses(
        (status = 200, description = "Environment provisioned, record is Creating", body = WorkflowRunResponse),
        (status = 400, description = "Validation error or job rejected the request"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "A step failed; completed steps are not rolled back"),
        (status = 504, description = "A provisioning job timed out")
    ),
    security(
        ("api_key" = [])
    ),
    tag = "Environments"
)]
pub async fn create_environment(
    State(state): State<AppState>,
    Json(payload): Json<CreateEnvironmentRequest>,
) -> Result<Json<WorkflowRunResponse>, WorkflowFailure> {
    let run = state.create_workflow.start(payload.into()).await?;
    Ok(Json(run.into()))
}

/// Start the delete workflow for an existing temporary environment
#[utoipa::path(
    delete,
    path = "/",
    request_body = DeleteEnvironmentRequest,
    responses(
        (status = 200, description = "Environment torn down and record removed", body = WorkflowRunResponse),
        (status = 400, description = "Validation error or job rejected the request"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Environment not found"),
        (status = 500, description = "A step failed; the record stays in Deleting"),
        (status = 504, description = "The teardown job timed out")
    ),
    security(
        ("api_key" = [])
    ),
    tag = "Environments"
)]
pub async fn delete_environment(
    State(state): State<AppState>,
    Json(payload): Json<DeleteEnvironmentRequest>,
) -> Result<Json<WorkflowRunResponse>, WorkflowFailure> {
    let run = state.delete_workflow.start(payload.into()).await?;
    Ok(Json(run.into()))
}

/// List every environment, oldest first
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "All environments ordered by createData", body = EnvironmentListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("api_key" = [])
    ),
    tag = "Environments"
)]
pub async fn list_environments(
    State(state): State<AppState>,
) -> AppResult<Json<EnvironmentListResponse>> {
    let mut records = state.environments.scan().await?;
    sort_by_creation(&mut records);

    Ok(Json(EnvironmentListResponse {
        result: records.into_iter().map(|r| r.into()).collect(),
    }))
}

/// Record an end-to-end test result on an environment.
/// An unknown id is answered with 200 and "Key not found".
#[utoipa::path(
    put,
    path = "/",
    request_body = UpdateTestResultRequest,
    responses(
        (status = 200, description = "\"Success\" or \"Key not found\"", body = String),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("api_key" = [])
    ),
    tag = "Environments"
)]
pub async fn update_test_result(
    State(state): State<AppState>,
    Json(payload): Json<UpdateTestResultRequest>,
) -> AppResult<Json<&'static str>> {
    let input = UpdateTestResult::from(payload);
    input.validate()?;

    if state.environments.find(&input.id).await?.is_none() {
        tracing::warn!(environment_id = %input.id, "Test result for unknown environment");
        return Ok(Json(KEY_NOT_FOUND));
    }

    state
        .environments
        .update_attribute(&input.id, AttributeUpdate::E2e(input.result.clone()))
        .await?;
    tracing::info!(environment_id = %input.id, e2e = %input.result, "Test result recorded");

    Ok(Json(UPDATE_SUCCESS))
}
