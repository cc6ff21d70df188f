//! Server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use redzone_core::ValidationError;
use redzone_repository::RepositoryError;
use redzone_runtime::{LifecycleError, RuntimeError};
use serde_json::json;
use thiserror::Error;

/// Server error type
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or unparsable caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required permission
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Illegal state transition or concurrent modification
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rule draft failed validation
    #[error("Validation failed: {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = match &self {
            ServerError::Validation(errors) => {
                let fields: Vec<_> = errors
                    .iter()
                    .map(|e| json!({ "field": e.path(), "message": e.to_string() }))
                    .collect();
                json!({
                    "error": self.to_string(),
                    "status": status.as_u16(),
                    "fields": fields,
                })
            }
            _ => json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ServerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => ServerError::NotFound(err.to_string()),
            RepositoryError::Conflict(msg) => ServerError::Conflict(msg),
            other => ServerError::InternalError(other.to_string()),
        }
    }
}

impl From<LifecycleError> for ServerError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(_) => ServerError::NotFound(err.to_string()),
            LifecycleError::Forbidden { .. } => ServerError::Forbidden(err.to_string()),
            LifecycleError::InvalidTransition { .. } => ServerError::Conflict(err.to_string()),
            LifecycleError::Conflict(msg) => ServerError::Conflict(msg),
            LifecycleError::Repository(e) => e.into(),
        }
    }
}

impl From<RuntimeError> for ServerError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Lifecycle(e) => e.into(),
            RuntimeError::Repository(e) => e.into(),
            other => ServerError::InternalError(other.to_string()),
        }
    }
}

impl From<Vec<ValidationError>> for ServerError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ServerError::Validation(errors)
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redzone_core::{AlertStatus, Permission};

    #[test]
    fn test_lifecycle_error_mapping() {
        let err: ServerError = LifecycleError::NotFound(7).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ServerError = LifecycleError::Forbidden {
            user_id: 3,
            permission: Permission::ApproveResolutions,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err: ServerError = LifecycleError::InvalidTransition {
            alert_id: 1,
            status: AlertStatus::Resolved,
            action: "escalate",
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ServerError = RepositoryError::not_found("rule", 4).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ServerError = RepositoryError::Conflict("open alert exists".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_runtime_error_mapping() {
        let err: ServerError = RuntimeError::MalformedRule {
            rule_id: 1,
            reason: "bad json".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerError>();
    }
}
