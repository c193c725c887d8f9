use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Test outcome every new environment starts with
pub const E2E_UNTESTED: &str = "UnTested";

/// Lifecycle status persisted on the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EnvStatus {
    /// Record inserted, provisioning jobs in progress
    Starting,
    /// Database and stack provisioned
    Creating,
    /// Teardown in progress
    Deleting,
}

impl EnvStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "Starting",
            Self::Creating => "Creating",
            Self::Deleting => "Deleting",
        }
    }
}

impl fmt::Display for EnvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Starting" => Ok(Self::Starting),
            "Creating" => Ok(Self::Creating),
            "Deleting" => Ok(Self::Deleting),
            other => Err(AppError::Database(format!("Unknown envStatus: {}", other))),
        }
    }
}

/// One row per temporary environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRecord {
    pub id: String,
    pub name: String,
    pub branch: String,
    pub url: String,
    pub env_status: EnvStatus,
    pub e2e: String,
    pub priority: String,
    pub create_data: String,
}

impl EnvironmentRecord {
    /// Initial record written by the first step of the create workflow
    pub fn starting(input: CreateEnvironment, id: String, create_data: String) -> Self {
        Self {
            id,
            name: input.name,
            branch: input.branch,
            url: input.url,
            env_status: EnvStatus::Starting,
            e2e: E2E_UNTESTED.to_string(),
            priority: String::new(),
            create_data,
        }
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.create_data, &Rfc3339).ok()
    }
}

/// Format a `createData` value: UTC with millisecond precision
pub fn creation_timestamp(now: OffsetDateTime) -> AppResult<String> {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    now.to_offset(time::UtcOffset::UTC)
        .format(&format)
        .map_err(|e| AppError::Internal(format!("Timestamp format error: {}", e)))
}

/// Sort ascending by creation time. Unparseable timestamps go last.
pub fn sort_by_creation(records: &mut [EnvironmentRecord]) {
    records.sort_by_cached_key(|r| {
        let created_at = r.created_at();
        (created_at.is_none(), created_at, r.create_data.clone())
    });
}

/// Single attribute written by an update-item call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeUpdate {
    EnvStatus(EnvStatus),
    E2e(String),
}

impl AttributeUpdate {
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::EnvStatus(_) => "envStatus",
            Self::E2e(_) => "e2e",
        }
    }

    pub fn apply(&self, record: &mut EnvironmentRecord) {
        match self {
            Self::EnvStatus(status) => record.env_status = *status,
            Self::E2e(result) => record.e2e = result.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnvironment {
    pub name: String,
    pub branch: String,
    pub url: String,
}

impl CreateEnvironment {
    pub fn validate(&self) -> AppResult<()> {
        validate_required("name", &self.name)?;
        validate_required("branch", &self.branch)?;
        validate_required("url", &self.url)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteEnvironment {
    pub id: String,
    /// Overrides the stored url for the teardown job
    pub url: Option<String>,
}

impl DeleteEnvironment {
    pub fn validate(&self) -> AppResult<()> {
        validate_required("id", &self.id)?;
        match &self.url {
            Some(url) => validate_required("url", url),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTestResult {
    pub id: String,
    pub result: String,
}

impl UpdateTestResult {
    pub fn validate(&self) -> AppResult<()> {
        validate_required("id", &self.id)?;
        validate_required("result", &self.result)
    }
}

/// Reject blank required fields
pub fn validate_required(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(id: &str, create_data: &str) -> EnvironmentRecord {
        EnvironmentRecord {
            id: id.to_string(),
            name: id.to_string(),
            branch: "main".to_string(),
            url: "http://x".to_string(),
            env_status: EnvStatus::Creating,
            e2e: E2E_UNTESTED.to_string(),
            priority: String::new(),
            create_data: create_data.to_string(),
        }
    }

    #[test]
    fn test_starting_record() {
        let input = CreateEnvironment {
            name: "env1".to_string(),
            branch: "main".to_string(),
            url: "http://x".to_string(),
        };
        let r = EnvironmentRecord::starting(input, "abc".to_string(), "2024-01-01T00:00:00.000Z".to_string());

        assert_eq!(r.env_status, EnvStatus::Starting);
        assert_eq!(r.e2e, "UnTested");
        assert_eq!(r.priority, "");
        assert_eq!(r.name, "env1");
    }

    #[test]
    fn test_record_json_keys() {
        let json = serde_json::to_value(record("a", "2024-01-01T00:00:00Z")).unwrap();
        assert_eq!(json["envStatus"], "Creating");
        assert_eq!(json["createData"], "2024-01-01T00:00:00Z");
        assert_eq!(json["e2e"], "UnTested");
    }

    #[test]
    fn test_env_status_names() {
        for status in [EnvStatus::Starting, EnvStatus::Creating, EnvStatus::Deleting] {
            assert_eq!(status.as_str().parse::<EnvStatus>().unwrap(), status);
        }
        assert!("Deleted".parse::<EnvStatus>().is_err());
    }

    #[test]
    fn test_creation_timestamp_format() {
        let ts = creation_timestamp(datetime!(2024-02-01 09:05:03.5 UTC)).unwrap();
        assert_eq!(ts, "2024-02-01T09:05:03.500Z");
    }

    #[test]
    fn test_sort_by_creation() {
        let mut records = vec![
            record("c", "garbage"),
            record("b", "2024-02-01T00:00:00Z"),
            record("a", "2024-01-01T00:00:00Z"),
            // Same instant written with more precision must not jump ahead
            record("a2", "2024-01-01T00:00:00.500Z"),
        ];
        sort_by_creation(&mut records);

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a2", "b", "c"]);
    }

    #[test]
    fn test_validation() {
        let input = CreateEnvironment {
            name: "env1".to_string(),
            branch: " ".to_string(),
            url: "http://x".to_string(),
        };
        assert!(matches!(input.validate(), Err(AppError::Validation(msg)) if msg.contains("branch")));

        let delete = DeleteEnvironment {
            id: "abc".to_string(),
            url: None,
        };
        assert!(delete.validate().is_ok());

        let update = UpdateTestResult {
            id: "abc".to_string(),
            result: String::new(),
        };
        assert!(update.validate().is_err());
    }
}
