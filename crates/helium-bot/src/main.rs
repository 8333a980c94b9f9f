//! Helium market maker - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Helium market maker (paper mode)
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via HELIUM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > HELIUM_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("HELIUM_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    // Logging verbosity depends on the strategy's debug flag
    let config = helium_bot::AppConfig::from_file(&config_path)?;
    helium_telemetry::init_logging(config.strategy.debug)?;

    info!("Starting Helium v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        trade_size = %config.strategy.trade_size,
        spread_factor = %config.strategy.spread_factor,
        dump_on_lockdown = config.strategy.dump_on_lockdown,
        "Configuration loaded"
    );

    let mut app = helium_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
