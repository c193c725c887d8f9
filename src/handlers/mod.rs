pub mod environment;
pub mod health;

pub use environment::{
    create_environment, delete_environment, list_environments, update_test_result,
    CreateEnvironmentRequest, DeleteEnvironmentRequest, EnvironmentListResponse,
    EnvironmentResponse, StepResponse, UpdateTestResultRequest, WorkflowRunResponse,
    KEY_NOT_FOUND, UPDATE_SUCCESS,
};
pub use health::{health, HealthResponse};
