use crate::batch::BatchError;
use crate::scoring::ScoringError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// The request body is not valid JSON.
    InvalidJson(String),
    /// The JSON does not describe a valid batch of applicant records.
    Validation(String),
    /// The scorer failed or broke its output contract.
    Scoring(String),
    /// Internal server error.
    Internal(String),
}

impl AppError {
    /// Short machine-readable kind included in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidJson(_) => "invalid_json",
            AppError::Validation(_) => "validation",
            AppError::Scoring(_) => "scoring",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Scoring(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidJson(msg) => write!(f, "Invalid JSON: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Scoring(msg) => write!(f, "Scoring error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// A body that is not JSON gets `{error}`; every other failure also
    /// carries `details` and `kind`.
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let body = match &self {
            AppError::InvalidJson(msg) => {
                tracing::debug!("Rejected non-JSON payload: {}", msg);
                json!({ "error": "Request payload must be JSON." })
            }
            AppError::Validation(msg) => {
                tracing::warn!("Rejected scoring request: {}", msg);
                json!({
                    "error": "Processing error. Check input data format.",
                    "details": msg,
                    "kind": kind,
                })
            }
            AppError::Scoring(msg) => {
                tracing::error!("Scoring error: {}", msg);
                json!({
                    "error": "Scoring failed.",
                    "details": msg,
                    "kind": kind,
                })
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({
                    "error": "Internal Server Error",
                    "details": msg,
                    "kind": kind,
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    /// Converts a body parse failure into an `AppError`.
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidJson(err.to_string())
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        AppError::Scoring(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            AppError::InvalidJson("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Scoring("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn batch_errors_become_validation_errors() {
        let err: AppError = BatchError::Empty.into();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn scoring_errors_keep_their_message() {
        let err: AppError = ScoringError::Model("boom".into()).into();
        assert!(err.to_string().contains("boom"));
    }
}
