use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{AttributeUpdate, EnvironmentRecord};
use crate::provisioning::{JobOutcome, JobRunner};
use crate::repositories::EnvironmentRepository;
use crate::workflow::{
    Effect, LifecycleState, Step, StepResult, WorkflowFailure, WorkflowKind, WorkflowRun,
};

/// Runs a chain of steps one at a time against the record store and the job runner
pub struct WorkflowEngine {
    environments: Arc<dyn EnvironmentRepository>,
    jobs: Arc<dyn JobRunner>,
    job_timeout: Duration,
}

impl WorkflowEngine {
    pub fn new(
        environments: Arc<dyn EnvironmentRepository>,
        jobs: Arc<dyn JobRunner>,
        job_timeout: Duration,
    ) -> Self {
        Self {
            environments,
            jobs,
            job_timeout,
        }
    }

    pub fn environments(&self) -> &Arc<dyn EnvironmentRepository> {
        &self.environments
    }

    /// Apply `chain` starting from `state`. The first failing step aborts the run.
    pub async fn run(
        &self,
        kind: WorkflowKind,
        chain: &[Step],
        mut record: EnvironmentRecord,
        mut state: LifecycleState,
    ) -> Result<WorkflowRun, WorkflowFailure> {
        let run_id = Uuid::new_v4();
        let mut completed: Vec<StepResult> = Vec::with_capacity(chain.len());

        tracing::info!(
            run_id = %run_id,
            workflow = kind.as_str(),
            environment_id = %record.id,
            state = %state,
            "Workflow started"
        );

        for &step in chain {
            let result = match step.transition(state, &record) {
                Ok(transition) => self.apply(&transition.effect).await.map(|_| transition),
                Err(e) => Err(e),
            };

            let transition = match result {
                Ok(transition) => transition,
                Err(error) => {
                    tracing::warn!(
                        run_id = %run_id,
                        workflow = kind.as_str(),
                        environment_id = %record.id,
                        step = step.as_str(),
                        state = %state,
                        error = %error,
                        "Workflow aborted"
                    );
                    return Err(WorkflowFailure {
                        run_id,
                        kind,
                        environment_id: Some(record.id),
                        failed_step: Some(step),
                        completed_steps: completed,
                        state,
                        error,
                    });
                }
            };

            state = transition.to;
            if let Some(status) = state.env_status() {
                record.env_status = status;
            }
            completed.push(StepResult { step, state });

            tracing::info!(
                run_id = %run_id,
                environment_id = %record.id,
                step = step.as_str(),
                state = %state,
                "Step completed"
            );
        }

        tracing::info!(
            run_id = %run_id,
            workflow = kind.as_str(),
            environment_id = %record.id,
            state = %state,
            "Workflow finished"
        );

        Ok(WorkflowRun {
            run_id,
            kind,
            record,
            state,
            steps: completed,
        })
    }

    /// Perform one effect: a single store operation or a single job run
    async fn apply(&self, effect: &Effect) -> AppResult<()> {
        match effect {
            Effect::PutRecord(record) => self.environments.insert(record).await,
            Effect::SetStatus { id, status } => {
                self.environments
                    .update_attribute(id, AttributeUpdate::EnvStatus(*status))
                    .await
            }
            Effect::RunJob(request) => {
                let job = request.kind.project_name();
                match self.jobs.run(request, self.job_timeout).await? {
                    JobOutcome::Succeeded { build_id, duration } => {
                        tracing::info!(
                            job = job,
                            build_id = %build_id,
                            duration_ms = duration.as_millis() as u64,
                            "Job succeeded"
                        );
                        Ok(())
                    }
                    JobOutcome::Failed { message } => Err(AppError::JobFailed { job, message }),
                    JobOutcome::TimedOut { after } => Err(AppError::JobTimedOut {
                        job,
                        seconds: after.as_secs(),
                    }),
                }
            }
            Effect::RemoveRecord { id } => self.environments.delete(id).await,
        }
    }
}
