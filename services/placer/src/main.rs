//! pixfleet placer
//!
//! Reads a feed of pixels that differ from a target image and writes them to
//! the canvas, rotating across the configured accounts as each one goes on
//! cooldown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use pixfleet_placer::config::{Config, CONFIG_FILE};
use pixfleet_placer::feed::{JsonLinesSource, UpdateSource};
use pixfleet_placer::scheduler::Scheduler;

/// Write a target image onto the canvas using a pool of accounts.
#[derive(Debug, Parser)]
#[command(name = "placer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON-lines file of image-relative pixels to write.
    feed: PathBuf,

    /// Path to the JSON config file.
    #[arg(long, env = "PIXFLEET_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log output format.
    #[arg(long, env = "PIXFLEET_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Err(e) = run(cli).await {
        error!(error = %e, "Placer stopped");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    info!(
        accounts = config.accounts.len(),
        anchor = %config.anchor(),
        sleep_seconds = config.sleep_seconds,
        "Configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
        }
    });

    let source = JsonLinesSource::new(&cli.feed);
    let updates = source
        .start(config.anchor(), shutdown_rx.clone())
        .await
        .with_context(|| format!("Failed to open update feed {:?}", cli.feed))?;

    let mut scheduler = Scheduler::from_config(&config).context("Failed to build scheduler")?;
    let summary = scheduler.run(updates, shutdown_rx).await?;

    info!(
        updates = summary.updates,
        placed = summary.placed,
        "Placer finished"
    );
    Ok(())
}
