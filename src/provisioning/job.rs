use serde::{Deserialize, Serialize};
use std::time::Duration;

/// External provisioning projects the workflows start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    CreateDatabase,
    CreateStack,
    DeleteStack,
}

impl JobKind {
    /// Build project name on the provisioning side
    pub fn project_name(&self) -> &'static str {
        match self {
            Self::CreateDatabase => "TemporaryEnv-CreateDatabase",
            Self::CreateStack => "TemporaryEnv-CreateStack",
            Self::DeleteStack => "TemporaryEnv-DeleteStack",
        }
    }
}

/// A single job start: which project, with which plaintext variable overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub kind: JobKind,
    pub variables: Vec<(String, String)>,
}

impl JobRequest {
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            variables: Vec::new(),
        }
    }

    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.push((name.to_string(), value.into()));
        self
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Terminal result of a job run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { build_id: String, duration: Duration },
    Failed { message: String },
    TimedOut { after: Duration },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_variables() {
        let request = JobRequest::new(JobKind::CreateStack)
            .with_var("URL", "http://x")
            .with_var("BRANCH", "main");

        assert_eq!(request.var("URL"), Some("http://x"));
        assert_eq!(request.var("BRANCH"), Some("main"));
        assert_eq!(request.var("OTHER"), None);
        assert_eq!(request.kind.project_name(), "TemporaryEnv-CreateStack");
    }
}
