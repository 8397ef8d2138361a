//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use secops_core::EngineError;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),

    // Lifecycle errors
    InvalidTransition(String),
    InsufficientEvidence(String),
    Cancelled(String),

    // Validation errors
    ValidationError(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::InsufficientEvidence(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Cancelled(_) => StatusCode::GONE,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::NotFound(msg)
            | AppError::InvalidTransition(msg)
            | AppError::InsufficientEvidence(msg)
            | AppError::Cancelled(msg)
            | AppError::ValidationError(msg) => msg.as_str(),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error"
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let msg = err.to_string();
        match err {
            EngineError::NotFound(_) => AppError::NotFound(msg),
            EngineError::InvalidTransition { .. } => AppError::InvalidTransition(msg),
            EngineError::InsufficientEvidence => AppError::InsufficientEvidence(msg),
            EngineError::InvalidConfiguration(_) => AppError::ValidationError(msg),
            EngineError::Cancelled(_) => AppError::Cancelled(msg),
            EngineError::RunAborted(_)
            | EngineError::ConfigIo(_)
            | EngineError::ConfigParse(_) => AppError::InternalError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_engine_error_status_mapping() {
        let cases = [
            (EngineError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                EngineError::InvalidTransition {
                    from: secops_core::logic::incident::IncidentStatus::Closed,
                    to: secops_core::logic::incident::IncidentStatus::Analyzing,
                },
                StatusCode::CONFLICT,
            ),
            (EngineError::InsufficientEvidence, StatusCode::UNPROCESSABLE_ENTITY),
            (EngineError::invalid_config("bad range"), StatusCode::BAD_REQUEST),
            (EngineError::Cancelled(Uuid::nil()), StatusCode::GONE),
            (EngineError::RunAborted("panic".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response = AppError::InternalError("secret path".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
