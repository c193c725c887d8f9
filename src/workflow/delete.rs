use std::sync::Arc;

use crate::error::AppError;
use crate::models::DeleteEnvironment;
use crate::workflow::{
    LifecycleState, WorkflowEngine, WorkflowFailure, WorkflowKind, WorkflowRun, DELETE_CHAIN,
};

/// Tears down a temporary environment and removes its record
#[derive(Clone)]
pub struct DeleteWorkflow {
    engine: Arc<WorkflowEngine>,
}

impl DeleteWorkflow {
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self { engine }
    }

    /// Load the record, then run the delete chain from its stored status.
    /// An unknown id is rejected before any step runs.
    pub async fn start(&self, input: DeleteEnvironment) -> Result<WorkflowRun, WorkflowFailure> {
        let id = input.id.clone();
        let reject = |state, error| {
            WorkflowFailure::rejected(WorkflowKind::Delete, Some(id.clone()), state, error)
        };

        input
            .validate()
            .map_err(|e| reject(LifecycleState::Absent, e))?;

        let mut record = self
            .engine
            .environments()
            .find(&input.id)
            .await
            .map_err(|e| reject(LifecycleState::Absent, e))?
            .ok_or_else(|| {
                reject(
                    LifecycleState::Absent,
                    AppError::NotFound("Environment".to_string()),
                )
            })?;

        // The teardown target from the request wins over the stored one
        if let Some(url) = input.url {
            record.url = url;
        }
        let state = LifecycleState::from(record.env_status);

        self.engine
            .run(WorkflowKind::Delete, &DELETE_CHAIN, record, state)
            .await
    }
}
