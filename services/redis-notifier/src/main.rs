//! Redis notifier CLI
//!
//! Watches a redis instance and posts outage and recovery alerts to a chat webhook.

use std::path::PathBuf;

use clap::Parser;
use redis_notifier::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "redis-notifier")]
#[command(about = "Posts redis outage and recovery alerts to a chat webhook")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Webhook URL (overrides config file)
    #[arg(long)]
    webhook_url: Option<String>,

    /// Label for the monitored instance in alert text (overrides config file)
    #[arg(long)]
    host: Option<String>,

    /// Redis address as host:port (overrides config file)
    #[arg(long)]
    redis_address: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, host={:?}, redis_address={:?}, log_level={:?}",
        args.config,
        args.host,
        args.redis_address,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(webhook_url) = args.webhook_url {
        config.webhook.url = Some(webhook_url);
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(redis_address) = args.redis_address {
        config.redis.address = redis_address;
    }

    tracing::info!("Starting redis notifier");
    redis_notifier::run(config).await?;

    Ok(())
}
