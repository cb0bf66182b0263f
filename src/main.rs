//! # SmartCourses
//!
//! Course marketplace API server.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database pool, migrations and seed data
//! - Redis client
//! - HTTP server

use anyhow::Result;
use tracing::info;

use smart_courses::config::Settings;
use smart_courses::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    smart_courses::telemetry::init_tracing();

    info!("Starting SmartCourses...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
