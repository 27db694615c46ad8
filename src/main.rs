use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use justlog::config::{Config, DEFAULT_CONFIG_FILE};
use justlog::logging::{JustlogLayer, Logger, MemoryRowStore};
use justlog::viewer::{self, ViewerState};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(&config_path)?;

    // Build the logger BEFORE any tracing calls
    let mut logger = Logger::from_config(&config.logger)?;
    if let Some(level) = config.logger.row_store_level {
        logger = logger.with_row_store(Arc::new(MemoryRowStore::new()), level);
    }
    let logger = Arc::new(logger);
    Logger::install_panic_hook(Arc::clone(&logger));

    let env_filter = tracing_subscriber::EnvFilter::try_from_env("JUSTLOG_LOG")
        .unwrap_or_else(|_| "justlog=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(JustlogLayer::new(Arc::clone(&logger)))
        .init();

    match logger.log_file_path() {
        Some(path) => tracing::info!("Logging to: {}", path.display()),
        None => tracing::info!("No log file configured, logging to stderr only"),
    }

    if !config.viewer.enabled {
        return Ok(());
    }

    let state = ViewerState::from_logger(&logger).with_default_per_page(config.viewer.per_page);
    let handle = viewer::start(config.viewer.port, Arc::new(state)).await?;

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await
}
