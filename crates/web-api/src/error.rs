use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, FieldViolation, RepositoryError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    /// Per-field violations, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn validation(message: impl Into<String>, details: Vec<FieldViolation>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ErrorBody {
                code: "VALIDATION_FAILED",
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use ApplicationError as AppErr;

        match error {
            AppErr::Domain(err @ DomainError::Validation { .. })
            | AppErr::Domain(err @ DomainError::InvalidArgument { .. }) => {
                ApiError::validation("invalid input", err.violations())
            }
            AppErr::Domain(DomainError::UserAlreadyExists) => ApiError::new(
                StatusCode::CONFLICT,
                "USER_EXISTS",
                "an account with this email already exists",
            ),
            AppErr::Domain(DomainError::UserNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", "user not found")
            }
            AppErr::Domain(DomainError::PostNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "POST_NOT_FOUND", "post not found")
            }
            AppErr::Domain(DomainError::NotPostCreator) => {
                ApiError::forbidden("only the creator may modify this post")
            }
            AppErr::Repository(RepositoryError::NotFound) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "requested resource not found",
            ),
            AppErr::Repository(RepositoryError::Conflict) => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
            }
            AppErr::Repository(RepositoryError::Storage { message }) => {
                tracing::error!(%message, "storage failure");
                ApiError::internal("storage failure")
            }
            AppErr::Password(err) => {
                tracing::error!(error = %err, "password backend failure");
                ApiError::internal("internal error")
            }
            AppErr::Asset(err) => {
                tracing::error!(error = %err, "asset store failure");
                ApiError::internal("internal error")
            }
            AppErr::Authentication => {
                ApiError::unauthorized("authentication failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
