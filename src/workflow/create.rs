use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{creation_timestamp, CreateEnvironment, EnvironmentRecord};
use crate::workflow::{
    LifecycleState, WorkflowEngine, WorkflowFailure, WorkflowKind, WorkflowRun, CREATE_CHAIN,
};

/// Provisions one new temporary environment end to end
#[derive(Clone)]
pub struct CreateWorkflow {
    engine: Arc<WorkflowEngine>,
}

impl CreateWorkflow {
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self { engine }
    }

    /// Generate id and timestamp, then run the create chain from `Absent`
    pub async fn start(&self, input: CreateEnvironment) -> Result<WorkflowRun, WorkflowFailure> {
        let reject = |error| {
            WorkflowFailure::rejected(WorkflowKind::Create, None, LifecycleState::Absent, error)
        };

        input.validate().map_err(reject)?;
        let create_data = creation_timestamp(OffsetDateTime::now_utc()).map_err(reject)?;
        let record = EnvironmentRecord::starting(input, Uuid::new_v4().to_string(), create_data);

        self.engine
            .run(WorkflowKind::Create, &CREATE_CHAIN, record, LifecycleState::Absent)
            .await
    }
}
