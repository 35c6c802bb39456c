use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, AppState};
use sickbay_core::config::data_dir_from_env_value;
use sickbay_core::CoreConfig;

/// Main entry point for the Sickbay application.
///
/// Starts the REST server that serves the school clinic record system:
/// login, visit lifecycle, student directory, staff registry, notification
/// tracker, and the admin dashboard, with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `SICKBAY_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `SICKBAY_DATA_DIR`: Directory for record storage (default: "clinic_data")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sickbay=info".parse()?)
                .add_directive("sickbay_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("SICKBAY_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting Sickbay REST on {}", rest_addr);

    let data_dir = data_dir_from_env_value(std::env::var("SICKBAY_DATA_DIR").ok());
    std::fs::create_dir_all(&data_dir)?;

    let cfg = Arc::new(CoreConfig::new(data_dir)?);
    let state = AppState::new(cfg);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
