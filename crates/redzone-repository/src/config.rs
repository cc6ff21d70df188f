//! Repository configuration and store construction

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    AlertRepository, CustomerSnapshotSource, MemoryStore, RepositoryError, RepositoryResult,
    RuleRepository, UserDirectory,
};

/// Repository source type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositorySource {
    /// Process-local store (tests, demos)
    #[default]
    Memory,
    /// PostgreSQL (requires the `postgres` feature)
    Database,
}

/// Repository configuration
///
/// ```rust
/// use redzone_repository::RepositoryConfig;
///
/// let config = RepositoryConfig::database("postgresql://localhost/redzone");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub source: RepositorySource,

    /// Database connection URL (required for Database source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Create the Red Zone tables on startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl RepositoryConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn database(url: impl Into<String>) -> Self {
        Self {
            source: RepositorySource::Database,
            database_url: Some(url.into()),
            run_migrations: false,
        }
    }

    pub fn with_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Returns an error if required fields are missing for the selected source
    pub fn validate(&self) -> RepositoryResult<()> {
        match self.source {
            RepositorySource::Memory => Ok(()),
            RepositorySource::Database => match self.database_url.as_deref() {
                Some(url) if !url.trim().is_empty() => Ok(()),
                _ => Err(RepositoryError::Config(
                    "database source requires database_url to be set".to_string(),
                )),
            },
        }
    }
}

/// The set of stores the engine and server need, behind trait objects
#[derive(Clone)]
pub struct Repositories {
    pub rules: Arc<dyn RuleRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub customers: Arc<dyn CustomerSnapshotSource>,
    pub users: Arc<dyn UserDirectory>,
}

impl Repositories {
    /// Share one in-memory store across all four roles
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            rules: store.clone(),
            alerts: store.clone(),
            customers: store.clone(),
            users: store,
        }
    }

    #[cfg(feature = "postgres")]
    pub fn from_postgres(repo: crate::PostgresRepository) -> Self {
        let repo = Arc::new(repo);
        Self {
            rules: repo.clone(),
            alerts: repo.clone(),
            customers: repo.clone(),
            users: repo,
        }
    }

    /// Build the stores described by `config`
    pub async fn connect(config: &RepositoryConfig) -> RepositoryResult<Self> {
        config.validate()?;
        match config.source {
            RepositorySource::Memory => {
                tracing::info!("Using in-memory Red Zone store");
                Ok(Self::from_memory(Arc::new(MemoryStore::new())))
            }
            RepositorySource::Database => Self::connect_database(config).await,
        }
    }

    #[cfg(feature = "postgres")]
    async fn connect_database(config: &RepositoryConfig) -> RepositoryResult<Self> {
        let url = config.database_url.as_deref().unwrap_or_default();
        let repo = crate::PostgresRepository::new(url).await?;
        if config.run_migrations {
            repo.run_migrations().await?;
        }
        tracing::info!("Connected to PostgreSQL Red Zone store");
        Ok(Self::from_postgres(repo))
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect_database(_config: &RepositoryConfig) -> RepositoryResult<Self> {
        Err(RepositoryError::Config(
            "database source requires the `postgres` feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config() {
        let config = RepositoryConfig::memory();
        assert_eq!(config.source, RepositorySource::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_config_requires_url() {
        let config = RepositoryConfig::database("postgresql://localhost/redzone").with_migrations(true);
        assert!(config.validate().is_ok());
        assert!(config.run_migrations);

        let config = RepositoryConfig {
            source: RepositorySource::Database,
            database_url: None,
            run_migrations: false,
        };
        assert!(matches!(config.validate(), Err(RepositoryError::Config(_))));
    }

    #[test]
    fn test_deserialize_lowercase_source() {
        let config: RepositoryConfig =
            serde_json::from_str(r#"{"source":"database","database_url":"postgres://x"}"#).unwrap();
        assert_eq!(config.source, RepositorySource::Database);
        assert!(!config.run_migrations);
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let repos = Repositories::connect(&RepositoryConfig::memory()).await.unwrap();
        assert!(repos.rules.list_rules().await.unwrap().is_empty());
    }
}
