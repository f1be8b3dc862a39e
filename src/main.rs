use anyhow::{Context, Result};
use pr_reviewer_lib::config::ServerConfig;
use pr_reviewer_lib::{db, server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    log::info!("[server] Starting pr-reviewer on port {}", config.port);

    let pool = db::initialize(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    server::start(&config, pool.clone()).await?;

    pool.close().await;
    log::info!("[server] Shutdown complete");

    Ok(())
}
