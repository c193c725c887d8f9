use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::{AppError, AppResult};
use crate::provisioning::{JobOutcome, JobRequest, JobRunner};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartBuildRequest<'a> {
    environment_variables: Vec<EnvironmentVariable<'a>>,
}

#[derive(Debug, Serialize)]
struct EnvironmentVariable<'a> {
    name: &'a str,
    value: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct BuildStatus {
    id: String,
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Drives a remote build service: start a build, then poll it to a terminal status
#[derive(Debug, Clone)]
pub struct HttpJobRunner {
    client: Client,
    base_url: String,
    poll_interval: Duration,
}

impl HttpJobRunner {
    pub fn new(base_url: impl Into<String>, poll_interval: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval,
        })
    }

    async fn start_build(&self, request: &JobRequest) -> AppResult<Result<BuildStatus, String>> {
        let url = format!(
            "{}/projects/{}/builds",
            self.base_url,
            request.kind.project_name()
        );
        let body = StartBuildRequest {
            environment_variables: request
                .variables
                .iter()
                .map(|(name, value)| EnvironmentVariable {
                    name,
                    value,
                    kind: "PLAINTEXT",
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Build service unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            // Keep the status code first so client faults stay recognisable
            let text = response.text().await.unwrap_or_default();
            return Ok(Err(format!("{} {}", status.as_u16(), text.trim())));
        }

        let build = response
            .json::<BuildStatus>()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid build service response: {}", e)))?;
        Ok(Ok(build))
    }

    async fn build_status(&self, build_id: &str) -> AppResult<BuildStatus> {
        let url = format!("{}/builds/{}", self.base_url, build_id);

        self.client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Internal(format!("Build status request failed: {}", e)))?
            .json::<BuildStatus>()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid build service response: {}", e)))
    }

    async fn run_to_completion(&self, request: &JobRequest, start: Instant) -> AppResult<JobOutcome> {
        let project = request.kind.project_name();

        let mut build = match self.start_build(request).await? {
            Ok(build) => build,
            Err(message) => return Ok(JobOutcome::Failed { message }),
        };
        tracing::info!(job = project, build_id = %build.id, "Job started");

        loop {
            match build.status.as_str() {
                "SUCCEEDED" => {
                    return Ok(JobOutcome::Succeeded {
                        build_id: build.id,
                        duration: start.elapsed(),
                    })
                }
                "TIMED_OUT" => {
                    return Ok(JobOutcome::TimedOut {
                        after: start.elapsed(),
                    })
                }
                "FAILED" | "FAULT" | "STOPPED" => {
                    let detail = build.message.unwrap_or_default();
                    return Ok(JobOutcome::Failed {
                        message: format!("build {} {} {}", build.id, build.status, detail)
                            .trim_end()
                            .to_string(),
                    });
                }
                _ => {}
            }

            tokio::time::sleep(self.poll_interval).await;
            build = self.build_status(&build.id).await?;
            tracing::debug!(job = project, build_id = %build.id, status = %build.status, "Job polled");
        }
    }
}

#[async_trait]
impl JobRunner for HttpJobRunner {
    async fn run(&self, request: &JobRequest, timeout: Duration) -> AppResult<JobOutcome> {
        let start = Instant::now();
        match tokio::time::timeout(timeout, self.run_to_completion(request, start)).await {
            Ok(result) => result,
            Err(_) => Ok(JobOutcome::TimedOut { after: timeout }),
        }
    }
}
