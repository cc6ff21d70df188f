//! Store and engine initialization

use crate::api::AppState;
use crate::catalog::catalog_from_config;
use crate::config::ServerConfig;
use anyhow::Result;
use redzone_repository::Repositories;
use tracing::info;

/// Connect the configured stores and wire the engine over them
pub async fn init_state(config: &ServerConfig) -> Result<AppState> {
    let repo_config = config.repository.to_repository_config();
    let repos = Repositories::connect(&repo_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize repositories: {}", e))?;
    info!(source = ?repo_config.source, "Repositories initialized");

    let catalog = catalog_from_config(config);
    info!(fields = catalog.len(), "Field catalog loaded");

    Ok(AppState::new(repos, catalog, config.sweep.options()))
}
