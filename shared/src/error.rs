//! Workflow error taxonomy
//!
//! Every transition in the document chain fails with one of these variants.
//! None of them is retried by the core; the caller decides.

use thiserror::Error;
use uuid::Uuid;

use crate::types::EntityKind;

/// Error returned by a rejected workflow operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Malformed or missing input; the caller can correct it and retry
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// The operation is not allowed from the entity's current status
    #[error("{entity} {id} is {current}; cannot {action}")]
    InvalidState {
        entity: EntityKind,
        id: Uuid,
        current: String,
        action: String,
    },

    /// Duplicate or idempotency violation
    #[error("{entity} conflict: {message}")]
    Conflict {
        entity: EntityKind,
        id: Option<Uuid>,
        message: String,
    },

    /// A predecessor document is not in the state this step requires
    #[error("{entity} {id} is {actual}; expected {expected}")]
    Precondition {
        entity: EntityKind,
        id: Uuid,
        expected: String,
        actual: String,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: Uuid },
}

impl WorkflowError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(entity: EntityKind, id: Option<Uuid>, message: impl Into<String>) -> Self {
        WorkflowError::Conflict {
            entity,
            id,
            message: message.into(),
        }
    }

    pub fn precondition(
        entity: EntityKind,
        id: Uuid,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        WorkflowError::Precondition {
            entity,
            id,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        WorkflowError::NotFound { entity, id }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
