//! Server configuration

use redzone_core::FieldCatalog;
use redzone_repository::RepositoryConfig;
use redzone_runtime::SweepOptions;
use serde::{Deserialize, Serialize};

/// Where rules, alerts and customers are stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepositoryType {
    /// Process-local store, empty on startup
    #[default]
    Memory,
    /// PostgreSQL
    Database {
        /// Database connection URL
        url: String,
        /// Create the Red Zone tables on startup
        #[serde(default)]
        run_migrations: bool,
    },
}

impl RepositoryType {
    /// Convert to the repository crate's configuration
    pub fn to_repository_config(&self) -> RepositoryConfig {
        match self {
            RepositoryType::Memory => RepositoryConfig::memory(),
            RepositoryType::Database {
                url,
                run_migrations,
            } => RepositoryConfig::database(url.clone()).with_migrations(*run_migrations),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Periodic sweep settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Run sweeps on an interval inside the server process
    pub enabled: bool,

    /// Seconds between sweep starts
    pub interval_secs: u64,

    /// A sweep still running after this many seconds is abandoned
    pub timeout_secs: u64,

    /// Customers per page
    pub page_size: usize,

    /// Concurrent customer passes within a page
    pub concurrency: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let options = SweepOptions::default();
        Self {
            enabled: false,
            interval_secs: 3600,
            timeout_secs: 1800,
            page_size: options.page_size,
            concurrency: options.concurrency,
        }
    }
}

impl SweepConfig {
    pub fn options(&self) -> SweepOptions {
        SweepOptions {
            page_size: self.page_size,
            concurrency: self.concurrency,
            resume_after: None,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (HTTP)
    pub port: u16,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Repository configuration
    pub repository: RepositoryType,

    /// Periodic sweep
    pub sweep: SweepConfig,

    /// Replaces the built-in customer field catalog when set
    pub available_fields: Option<FieldCatalog>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            repository: RepositoryType::default(),
            sweep: SweepConfig::default(),
            available_fields: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, `config/server.*` and `REDZONE_*` variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from("config/server")
    }

    /// Load from the config file at `path` (any extension the `config` crate
    /// understands, optional) overlaid with `REDZONE_*` variables.
    ///
    /// Nested keys use `__`, e.g. `REDZONE_SWEEP__INTERVAL_SECS=600`.
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("REDZONE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read config: {}", e))?;

        config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e))
    }

    /// `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
