//! Red Zone HTTP Server
//!
//! Serves the rule and alert API and optionally sweeps on an interval.

use anyhow::Result;
use redzone_server::api;
use redzone_server::config::{LogFormat, ServerConfig};
use redzone_server::engine::init_state;
use redzone_server::scheduler::spawn_sweep_scheduler;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize tracing
    init_tracing(&config)?;
    info!("Loaded configuration: {:?}", config);

    let state = init_state(&config).await?;
    info!("Red zone engine initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = if config.sweep.enabled {
        Some(spawn_sweep_scheduler(
            state.sweeper.clone(),
            config.sweep.clone(),
            shutdown_rx,
        ))
    } else {
        info!("Interval sweep disabled");
        None
    };

    let app = api::create_router(state);

    // Start server
    let addr = config.bind_address();
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Red zone API: http://{}/api/red-zone", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler {
        handle.await?;
    }
    info!("Server stopped");

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "redzone_server={level},redzone_runtime={level},redzone_repository={level},tower_http=debug",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
