//! config-to-csv command-line entry point

use anyhow::Context;
use clap::Parser;
use config_to_csv::{
    cli::{run_cli, ConfigToCsvCli},
    config::{AppConfig, JsonFileStore},
    logging::{init_logging, LogConfig},
    Result,
};
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = ConfigToCsvCli::parse();

    let log_config = if cli.verbose {
        LogConfig::development()
    } else {
        LogConfig::from_env()
    };
    init_logging(&log_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("config-to-csv v{}", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let app_config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    debug!("Application configuration: {:?}", app_config);

    let store = JsonFileStore::open(&app_config.storage.settings_path).with_context(|| {
        format!(
            "Failed to open settings store {}",
            app_config.storage.settings_path.display()
        )
    })?;
    debug!("Settings store at {}", store.path().display());

    run_cli(cli, app_config, store)
}
