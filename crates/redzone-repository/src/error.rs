//! Error types for the repository layer

use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Row not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Uniqueness or compare-and-set violation.
    ///
    /// Raised when an open alert already exists for the same customer and
    /// rule, or when an alert's status changed underneath a transition.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored rule whose JSON columns no longer decode
    #[error("Rule {id} is malformed: {reason}")]
    Malformed { id: i64, reason: String },

    /// JSON encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error (when database feature is enabled)
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Invalid repository configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("Repository error: {0}")]
    Other(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        RepositoryError::NotFound { entity, id }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        // 23505 = unique_violation
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                return RepositoryError::Conflict(db.message().to_string());
            }
        }
        RepositoryError::Database(err)
    }
}
