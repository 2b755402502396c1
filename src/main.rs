//! Compensation engine HTTP server.
//!
//! Loads statutory rates from `CONFIG_DIR` (default `./config/au_2024_25`)
//! and listens on `PORT` (default 3000).

use compensation_engine::api::{AppState, create_router};
use compensation_engine::config::ConfigLoader;

const DEFAULT_CONFIG_DIR: &str = "./config/au_2024_25";
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_dir =
        std::env::var("CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let loader = ConfigLoader::load(&config_dir).map_err(|e| {
        tracing::error!(config_dir = %config_dir, "Failed to load configuration: {e}");
        e
    })?;
    tracing::info!(
        config_dir = %config_dir,
        financial_year = %loader.config().metadata().financial_year,
        "Configuration loaded"
    );

    let app = create_router(AppState::new(loader));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Compensation engine listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
