use anyhow::Context;
use streamwatch::config::StreamwatchConfig;
use streamwatch::logging::init_logging;
use streamwatch::services::ServiceContainer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = StreamwatchConfig::from_env().context("invalid configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let (logging_config, _log_guard) =
        init_logging(config.log_dir.as_deref()).context("failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        watchlist = %config.watchlist_path.display(),
        "Starting streamwatch"
    );

    let container = ServiceContainer::new(config)?.with_logging_config(logging_config);
    container.initialize().await?;
    container.start();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    container.shutdown().await?;
    Ok(())
}
