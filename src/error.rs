use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that can be returned from handlers and workflow steps
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Access errors
    #[error("Forbidden")]
    Forbidden,

    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Lifecycle errors
    #[error("Step {step} cannot run from state {from}")]
    InvalidTransition { step: &'static str, from: &'static str },

    // Provisioning job errors
    #[error("Job {job} failed: {message}")]
    JobFailed { job: &'static str, message: String },

    #[error("Job {job} timed out after {seconds}s")]
    JobTimedOut { job: &'static str, seconds: u64 },

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status, public message and optional details for this error
    pub fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 403 Forbidden
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden", None),

            // 404 Not Found
            AppError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "Not found", Some(resource.clone()))
            }

            // 409 Conflict
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::InvalidTransition { .. } => (
                StatusCode::CONFLICT,
                "Invalid state transition",
                Some(self.to_string()),
            ),

            // 400 Bad Request
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),

            // 400 or 500 depending on what the job reported
            AppError::JobFailed { message, .. } => {
                if is_client_fault(message) {
                    (StatusCode::BAD_REQUEST, "Job rejected", Some(self.to_string()))
                } else {
                    tracing::error!("{}", self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Job failed",
                        Some(self.to_string()),
                    )
                }
            }

            // 504 Gateway Timeout
            AppError::JobTimedOut { .. } => {
                tracing::error!("{}", self);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Job timed out",
                    Some(self.to_string()),
                )
            }

            // 500 Internal Server Error
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        }
    }
}

/// A job failure message that starts with a 4xx status code is a client fault
pub fn is_client_fault(message: &str) -> bool {
    let code: String = message.trim_start().chars().take(3).collect();
    code.len() == 3
        && code.starts_with('4')
        && code.chars().all(|c| c.is_ascii_digit())
        && !message
            .trim_start()
            .chars()
            .nth(3)
            .is_some_and(|c| c.is_ascii_digit())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = self.parts();

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

// Conversion from SeaORM errors

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        if let Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
            return AppError::Conflict("Environment".to_string());
        }
        match err {
            sea_orm::DbErr::RecordNotFound(_) => AppError::NotFound("Environment".to_string()),
            sea_orm::DbErr::RecordNotInserted => AppError::Conflict("Environment".to_string()),
            sea_orm::DbErr::RecordNotUpdated => AppError::NotFound("Environment".to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_fault_pattern() {
        assert!(is_client_fault("400 Bad Request: unknown branch"));
        assert!(is_client_fault("404"));
        assert!(!is_client_fault("500 Internal Server Error"));
        assert!(!is_client_fault("exit status 4"));
        assert!(!is_client_fault("4000 widgets"));
        assert!(!is_client_fault(""));
    }

    #[test]
    fn test_job_failure_status() {
        let client = AppError::JobFailed {
            job: "TemporaryEnv-CreateStack",
            message: "422 branch does not exist".to_string(),
        };
        assert_eq!(client.parts().0, StatusCode::BAD_REQUEST);

        let server = AppError::JobFailed {
            job: "TemporaryEnv-CreateStack",
            message: "build FAILED".to_string(),
        };
        assert_eq!(server.parts().0, StatusCode::INTERNAL_SERVER_ERROR);

        let timeout = AppError::JobTimedOut {
            job: "TemporaryEnv-DeleteStack",
            seconds: 60,
        };
        assert_eq!(timeout.parts().0, StatusCode::GATEWAY_TIMEOUT);
    }
}
