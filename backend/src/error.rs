//! Error handling for the procurement backend
//!
//! Every failure leaving a handler is rendered as
//! `{ "error": { code, message, ... } }` with a status code matching its kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{EntityKind, WorkflowError};
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Workflow errors raised by the document chain
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Workflow(WorkflowError::validation(field, message))
    }

    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        AppError::Workflow(WorkflowError::not_found(entity, id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidToken | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Workflow(err) => match err {
                WorkflowError::Validation { .. } => StatusCode::BAD_REQUEST,
                WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
                WorkflowError::Conflict { .. } => StatusCode::CONFLICT,
                WorkflowError::InvalidState { .. } | WorkflowError::Precondition { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            AppError::Configuration(_)
            | AppError::Database(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Default, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_state: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            ..Default::default()
        }
    }
}

impl From<&WorkflowError> for ErrorDetail {
    fn from(err: &WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::Validation { field, .. } => Self {
                field: Some(field.clone()),
                ..Self::new("VALIDATION_ERROR", message)
            },
            WorkflowError::InvalidState {
                entity, id, current, ..
            } => Self {
                entity: Some(*entity),
                id: Some(*id),
                current_state: Some(current.clone()),
                ..Self::new("INVALID_STATE", message)
            },
            WorkflowError::Conflict { entity, id, .. } => Self {
                entity: Some(*entity),
                id: *id,
                ..Self::new("CONFLICT", message)
            },
            WorkflowError::Precondition {
                entity,
                id,
                expected,
                actual,
            } => Self {
                entity: Some(*entity),
                id: Some(*id),
                current_state: Some(actual.clone()),
                expected_state: Some(expected.clone()),
                ..Self::new("PRECONDITION_FAILED", message)
            },
            WorkflowError::NotFound { entity, id } => Self {
                entity: Some(*entity),
                id: Some(*id),
                ..Self::new("NOT_FOUND", message)
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            AppError::InvalidToken => ErrorDetail::new("INVALID_TOKEN", "Invalid token"),
            AppError::InsufficientPermissions => ErrorDetail::new(
                "INSUFFICIENT_PERMISSIONS",
                "You do not have permission to perform this action",
            ),
            AppError::Unauthorized(message) => ErrorDetail::new("UNAUTHORIZED", message.clone()),
            AppError::Workflow(err) => ErrorDetail::from(err),
            AppError::Configuration(msg) => {
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg))
            }
            AppError::Database(_) => ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            AppError::Internal(msg) => ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            AppError::InternalError(_) => {
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred")
            }
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
