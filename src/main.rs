//! synth-pool-settlement server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use synth_pool_settlement::app::{build_app, build_engine};
use synth_pool_settlement::config::SettlementConfig;
use synth_pool_settlement::persistence::{PostgresPersistence, spawn_event_recorder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = SettlementConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(
        addr = %config.listen_addr,
        operator = %config.operator,
        listings = config.listings.len(),
        settlement_delay_secs = config.settlement_delay_secs,
        "starting synth-pool-settlement"
    );

    // Build collaborators, service and state
    let engine = build_engine(&config);

    // Event log
    if config.persistence_enabled {
        let persistence = PostgresPersistence::connect(&config)
            .await
            .context("connecting to database")?;
        persistence.migrate().await.context("running migrations")?;
        let _recorder = spawn_event_recorder(persistence, engine.state.event_bus.subscribe());
        tracing::info!("event log enabled");
    } else {
        tracing::info!("event log disabled");
    }

    // Build router
    let app = build_app(engine.state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
