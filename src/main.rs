//! waitlist-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use waitlist_gateway::api;
use waitlist_gateway::app_state::AppState;
use waitlist_gateway::config::GatewayConfig;
use waitlist_gateway::domain::EventBus;
use waitlist_gateway::persistence::{
    EventDirectory, InMemoryPersistence, PostgresPersistence, WaitlistStore,
};
use waitlist_gateway::service::WaitlistService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting waitlist-gateway");

    // Build persistence layer
    let (store, events, storage): (Arc<dyn WaitlistStore>, Arc<dyn EventDirectory>, _) =
        if config.persistence_enabled {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .min_connections(config.database_min_connections)
                .acquire_timeout(config.database_connect_timeout())
                .connect(&config.database_url)
                .await
                .context("failed to connect to PostgreSQL")?;
            let persistence = Arc::new(PostgresPersistence::new(pool));
            persistence
                .migrate()
                .await
                .context("failed to apply migrations")?;
            tracing::info!("using PostgreSQL storage");
            (
                Arc::clone(&persistence) as Arc<dyn WaitlistStore>,
                persistence as Arc<dyn EventDirectory>,
                "postgres",
            )
        } else {
            let persistence = Arc::new(InMemoryPersistence::new());
            tracing::info!("using in-memory storage");
            (
                Arc::clone(&persistence) as Arc<dyn WaitlistStore>,
                persistence as Arc<dyn EventDirectory>,
                "memory",
            )
        };

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let waitlist_service = Arc::new(WaitlistService::new(
        store,
        events,
        event_bus,
        config.retry_policy(),
        config.default_max_waitlist_size,
    ));

    // Build application state and router
    let app_state = AppState::new(waitlist_service, storage);
    let app = api::app(app_state, config.request_timeout());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
