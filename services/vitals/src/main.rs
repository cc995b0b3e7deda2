//! Vitals CLI
//!
//! Command-line interface for the live vitals telemetry service.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use vitals::{load_config, Config, VitalsBuilder};

#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "Live vitals telemetry aggregation and recommendation service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server port (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info", value_parser = parse_log_level)]
    log_level: Level,
}

fn parse_log_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|_| {
        format!(
            "Invalid log level: {}. Use: trace, debug, info, warn, error",
            s
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, log_level={:?}",
        args.config,
        args.port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets()?;

    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Starting vitals service");
    tracing::debug!(
        "Retention {:?}, collection {:?}, session policy {:?}, report store {}",
        config.telemetry.retention_horizon,
        config.telemetry.collection_interval,
        config.session.policy,
        if config.store.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    VitalsBuilder::new(config).build().await?.start().await?;

    Ok(())
}
