//! opencode-manager - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the resource manager API.

use opencode_manager::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opencode_manager=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        catalog = %config.catalog_url,
        skill_requests = config.github.is_configured(),
        "Loaded configuration"
    );

    api::serve(config).await?;

    Ok(())
}
