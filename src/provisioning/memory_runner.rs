use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::provisioning::{JobKind, JobOutcome, JobRequest, JobRunner};

/// In-process job runner for tests: records every request and returns
/// scripted outcomes per job kind (success unless told otherwise)
#[derive(Clone, Default)]
pub struct RecordingJobRunner {
    inner: Arc<Mutex<RecordingInner>>,
}

#[derive(Default)]
struct RecordingInner {
    requests: Vec<JobRequest>,
    outcomes: HashMap<JobKind, JobOutcome>,
}

impl RecordingJobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future run of `kind` fail with `message`
    pub async fn fail(&self, kind: JobKind, message: &str) {
        self.inner.lock().await.outcomes.insert(
            kind,
            JobOutcome::Failed {
                message: message.to_string(),
            },
        );
    }

    /// Make every future run of `kind` time out
    pub async fn time_out(&self, kind: JobKind) {
        self.inner
            .lock()
            .await
            .outcomes
            .insert(kind, JobOutcome::TimedOut { after: Duration::ZERO });
    }

    /// Requests received so far, in order
    pub async fn requests(&self) -> Vec<JobRequest> {
        self.inner.lock().await.requests.clone()
    }
}

#[async_trait]
impl JobRunner for RecordingJobRunner {
    async fn run(&self, request: &JobRequest, timeout: Duration) -> AppResult<JobOutcome> {
        let mut inner = self.inner.lock().await;
        inner.requests.push(request.clone());

        let outcome = match inner.outcomes.get(&request.kind) {
            Some(JobOutcome::TimedOut { .. }) => JobOutcome::TimedOut { after: timeout },
            Some(outcome) => outcome.clone(),
            None => JobOutcome::Succeeded {
                build_id: format!("{}:{}", request.kind.project_name(), inner.requests.len()),
                duration: Duration::ZERO,
            },
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_scripts() {
        let runner = RecordingJobRunner::new();
        runner.fail(JobKind::CreateStack, "boom").await;

        let db = JobRequest::new(JobKind::CreateDatabase).with_var("URL", "http://x");
        let stack = JobRequest::new(JobKind::CreateStack).with_var("URL", "http://x");

        assert!(runner.run(&db, Duration::from_secs(1)).await.unwrap().is_success());
        assert_eq!(
            runner.run(&stack, Duration::from_secs(1)).await.unwrap(),
            JobOutcome::Failed {
                message: "boom".to_string()
            }
        );
        assert_eq!(runner.requests().await, vec![db, stack]);
    }
}
