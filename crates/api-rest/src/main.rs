//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the
//! REST server (with OpenAPI/Swagger UI). The workspace's main `sickbay-run`
//! binary is the deployment entry point.

use api_rest::{app, AppState};
use sickbay_core::config::data_dir_from_env_value;
use sickbay_core::CoreConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Sickbay REST API server.
///
/// Starts the REST API server on the configured address (default:
/// 0.0.0.0:3000) and serves the clinic endpoints with OpenAPI/Swagger
/// documentation.
///
/// # Environment Variables
/// - `SICKBAY_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `SICKBAY_DATA_DIR`: Record storage directory (default: "clinic_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the data directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("sickbay_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("SICKBAY_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting Sickbay REST API on {}", addr);

    let data_dir = data_dir_from_env_value(std::env::var("SICKBAY_DATA_DIR").ok());
    std::fs::create_dir_all(&data_dir)?;

    let cfg = Arc::new(CoreConfig::new(data_dir)?);
    let state = AppState::new(cfg);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
