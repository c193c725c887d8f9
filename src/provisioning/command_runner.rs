use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::provisioning::{JobKind, JobOutcome, JobRequest, JobRunner};

/// Bytes of stderr kept in a failure message
const STDERR_TAIL: usize = 512;

/// Runs each job as a local shell command with the request variables in its environment
#[derive(Debug, Clone)]
pub struct CommandJobRunner {
    commands: HashMap<JobKind, String>,
}

impl CommandJobRunner {
    pub fn new(commands: HashMap<JobKind, String>) -> Self {
        Self { commands }
    }

    pub fn from_config(config: &Config) -> Self {
        let commands = [JobKind::CreateDatabase, JobKind::CreateStack, JobKind::DeleteStack]
            .into_iter()
            .map(|kind| (kind, config.command_for(kind).to_string()))
            .collect();
        Self::new(commands)
    }
}

#[async_trait]
impl JobRunner for CommandJobRunner {
    async fn run(&self, request: &JobRequest, timeout: Duration) -> AppResult<JobOutcome> {
        let project = request.kind.project_name();
        let command = self.commands.get(&request.kind).ok_or_else(|| {
            AppError::Internal(format!("No command configured for {}", project))
        })?;

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .env("JOB_NAME", project)
            .envs(request.variables.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let child = cmd
            .spawn()
            .map_err(|e| AppError::Internal(format!("Failed to spawn {}: {}", project, e)))?;
        let build_id = child.id().map(|pid| pid.to_string()).unwrap_or_default();
        tracing::info!(job = project, build_id = %build_id, "Job started");

        // Dropping the future on timeout kills the child
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| AppError::Internal(format!("Failed to wait for {}: {}", project, e)))?,
            Err(_) => return Ok(JobOutcome::TimedOut { after: timeout }),
        };

        if output.status.success() {
            return Ok(JobOutcome::Succeeded {
                build_id,
                duration: start.elapsed(),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let tail_start = stderr
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| stderr.len() - i <= STDERR_TAIL)
            .unwrap_or(stderr.len());
        let message = match output.status.code() {
            Some(code) => format!("exit status {}: {}", code, &stderr[tail_start..]),
            None => format!("terminated by signal: {}", &stderr[tail_start..]),
        };

        Ok(JobOutcome::Failed { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(command: &str) -> CommandJobRunner {
        let commands = [JobKind::CreateDatabase, JobKind::CreateStack, JobKind::DeleteStack]
            .into_iter()
            .map(|kind| (kind, command.to_string()))
            .collect();
        CommandJobRunner::new(commands)
    }

    #[tokio::test]
    async fn test_success_sees_variables() {
        let runner = runner(r#"test "$URL" = "http://x" && test "$BRANCH" = "main" && test "$JOB_NAME" = "TemporaryEnv-CreateStack""#);
        let request = JobRequest::new(JobKind::CreateStack)
            .with_var("URL", "http://x")
            .with_var("BRANCH", "main");

        let outcome = runner.run(&request, Duration::from_secs(10)).await.unwrap();
        assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    }

    #[tokio::test]
    async fn test_failure_reports_exit_status() {
        let runner = runner("echo 'stack rollback' >&2; exit 3");
        let request = JobRequest::new(JobKind::DeleteStack).with_var("URL", "http://x");

        let outcome = runner.run(&request, Duration::from_secs(10)).await.unwrap();
        match outcome {
            JobOutcome::Failed { message } => {
                assert!(message.starts_with("exit status 3"));
                assert!(message.contains("stack rollback"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = runner("sleep 5");
        let request = JobRequest::new(JobKind::CreateDatabase);

        let outcome = runner.run(&request, Duration::from_millis(100)).await.unwrap();
        assert_eq!(
            outcome,
            JobOutcome::TimedOut {
                after: Duration::from_millis(100)
            }
        );
    }
}
