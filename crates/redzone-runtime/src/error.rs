//! Runtime error types

use redzone_core::{AlertStatus, Permission};
use redzone_repository::RepositoryError;
use thiserror::Error;

/// Errors raised while evaluating rules or running a sweep
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Stored rule JSON that no longer decodes
    #[error("Malformed rule {rule_id}: {reason}")]
    MalformedRule { rule_id: i64, reason: String },

    /// A condition references a field missing from the available-fields catalog
    #[error("Rule {rule_id} references unknown field '{field}'")]
    UnknownField { rule_id: i64, field: String },

    /// Lifecycle failure while creating or transitioning an alert
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Store failure
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised by alert lifecycle operations.
///
/// Authorization, missing alerts and illegal transitions are distinct so the
/// caller can report them distinctly.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Alert not found: {0}")]
    NotFound(i64),

    #[error("User {user_id} lacks permission {permission}")]
    Forbidden { user_id: i64, permission: Permission },

    #[error("Cannot {action} alert {alert_id} in status {status}")]
    InvalidTransition {
        alert_id: i64,
        status: AlertStatus,
        action: &'static str,
    },

    /// The alert changed concurrently, or an open alert already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for LifecycleError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => LifecycleError::Conflict(msg),
            other => LifecycleError::Repository(other),
        }
    }
}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;
