use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wpools::application::{Cli, CommandExecutor};
use wpools::shared::config::ConfigLoader;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config file first, CLI path overrides the default location
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load_config()?,
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    CommandExecutor::execute(cli.command, config)?;
    Ok(())
}
