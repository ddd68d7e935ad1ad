//! Headless battle simulator entry point.
mod app;
mod config;
mod encounter;
mod logging;
mod report;

use anyhow::Result;
use config::SimConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SimConfig::from_env();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = logging::init(&config)?;

    app::run(config).await
}
