use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single failed input check, reported back to the caller by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
    #[error("validation failed")]
    Validation { violations: Vec<FieldViolation> },
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("user not found")]
    UserNotFound,
    #[error("post not found")]
    PostNotFound,
    #[error("caller is not the post creator")]
    NotPostCreator,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    /// Flatten into the per-field list used in error responses.
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self {
            Self::InvalidArgument { field, reason } => {
                vec![FieldViolation::new(field.clone(), reason.clone())]
            }
            Self::Validation { violations } => violations.clone(),
            _ => Vec::new(),
        }
    }
}

/// Errors surfaced by the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("resource not found")]
    NotFound,
    #[error("resource already exists")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
