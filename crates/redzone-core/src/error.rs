//! Error types for Red Zone Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown logic operator: {0}")]
    UnknownLogicOperator(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Unknown alert status: {0}")]
    UnknownStatus(String),

    #[error("Unknown activity action: {0}")]
    UnknownAction(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("Invalid actor: {0}")]
    InvalidActor(String),

    #[error("Malformed conditions: {0}")]
    MalformedConditions(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::UnknownOperator("between".to_string());
        assert_eq!(err.to_string(), "Unknown operator: between");

        let err = CoreError::MalformedConditions("expected array".to_string());
        assert_eq!(err.to_string(), "Malformed conditions: expected array");
    }
}
