//! Taleweaver API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use taleweaver_api::config::AppConfig;
use taleweaver_api::error::AppError;
use taleweaver_api::routes;
use taleweaver_api::state::AppState;
use taleweaver_api::telemetry;
use taleweaver_core::clock::SystemClock;
use taleweaver_llm::ChatCompletionsClient;
use taleweaver_store::{MIGRATOR, PgStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    info!(
        narrator = %config.narrator.base_url,
        model = %config.narrator.model,
        "Starting Taleweaver API server"
    );

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    if config.run_migrations {
        MIGRATOR.run(&pool).await?;
        info!("Database migrations applied");
    }

    let narrator = ChatCompletionsClient::new(config.narrator.clone())
        .map_err(|e| AppError::Config(format!("narrator client: {e}")))?;
    let app_state = AppState::new(
        PgStore::new(pool),
        Arc::new(narrator),
        Arc::new(SystemClock),
        config.generation_timeout,
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}
