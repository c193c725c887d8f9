pub mod command_runner;
pub mod http_runner;
pub mod job;
pub mod memory_runner;

pub use command_runner::CommandJobRunner;
pub use http_runner::HttpJobRunner;
pub use job::{JobKind, JobOutcome, JobRequest};
pub use memory_runner::RecordingJobRunner;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::AppResult;

/// Starts a provisioning job and waits for its terminal state.
///
/// `Err` means the runner could not reach the build system at all; a job
/// that ran and did not succeed is reported as `Ok(JobOutcome::Failed)` or
/// `Ok(JobOutcome::TimedOut)`.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, request: &JobRequest, timeout: Duration) -> AppResult<JobOutcome>;
}
