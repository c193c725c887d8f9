use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::EnvironmentRecord;
use crate::workflow::{LifecycleState, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Create,
    Delete,
}

impl WorkflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

/// A completed step and the state it left the environment in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub step: Step,
    pub state: LifecycleState,
}

/// A run that went through its whole chain
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub run_id: Uuid,
    pub kind: WorkflowKind,
    pub record: EnvironmentRecord,
    pub state: LifecycleState,
    pub steps: Vec<StepResult>,
}

/// A run that stopped early. Completed steps are not undone: `state` is what
/// the environment was left in and needs manual reconciliation when a job
/// had already started.
#[derive(Debug)]
pub struct WorkflowFailure {
    pub run_id: Uuid,
    pub kind: WorkflowKind,
    pub environment_id: Option<String>,
    /// `None` when the request was rejected before any step ran
    pub failed_step: Option<Step>,
    pub completed_steps: Vec<StepResult>,
    pub state: LifecycleState,
    pub error: AppError,
}

impl WorkflowFailure {
    /// Request refused before the chain started
    pub fn rejected(
        kind: WorkflowKind,
        environment_id: Option<String>,
        state: LifecycleState,
        error: AppError,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            kind,
            environment_id,
            failed_step: None,
            completed_steps: Vec::new(),
            state,
            error,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    execution_id: Uuid,
    workflow: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_step: Option<&'static str>,
    state: &'static str,
    completed_steps: Vec<&'static str>,
}

impl IntoResponse for WorkflowFailure {
    fn into_response(self) -> Response {
        let (status, error_message, details) = self.error.parts();

        let body = Json(FailureBody {
            error: error_message.to_string(),
            details,
            execution_id: self.run_id,
            workflow: self.kind.as_str(),
            id: self.environment_id,
            failed_step: self.failed_step.map(|s| s.as_str()),
            state: self.state.as_str(),
            completed_steps: self.completed_steps.iter().map(|s| s.step.as_str()).collect(),
        });

        (status, body).into_response()
    }
}
