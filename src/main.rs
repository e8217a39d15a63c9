//! # Skillshare Chat Server
//!
//! Entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Stores (PostgreSQL or in-memory)
//! - HTTP/WebSocket server and the presence sweeper

use anyhow::Result;
use tracing::info;

use skillshare_chat::config::Settings;
use skillshare_chat::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    skillshare_chat::telemetry::init_tracing();

    info!("Starting chat server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        persistent = settings.database.url.is_some(),
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
