//! Rate Refresher Binary
//!
//! Fetches exchange rates relative to USD once a day and stores them for the
//! converter to load.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use converter_rates::{
    DailySchedule, ExchangeRateApiProvider, JsonFileRateStore, RefreshJob, RefresherConfig,
};

/// Daily exchange rate refresher
#[derive(Parser, Debug)]
#[command(name = "rate-refresher")]
#[command(about = "Fetch exchange rates once a day and store them")]
struct Args {
    /// Run a single refresh and exit
    #[arg(long)]
    once: bool,

    /// Where to store the rates (overrides RATES_OUTPUT_PATH)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Hour of day in UTC to refresh at (overrides RATES_REFRESH_HOUR_UTC)
    #[arg(long)]
    hour: Option<u32>,

    /// Rate API base URL (overrides EXCHANGE_RATE_API_URL)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = RefresherConfig::from_env();
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(hour) = args.hour {
        config.refresh_hour_utc = hour;
    }
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let provider = ExchangeRateApiProvider::new(
        config.api_base_url.clone(),
        config.api_key.clone(),
        config.request_timeout,
    )?;
    let store = JsonFileRateStore::new(config.output_path.clone());
    let job = RefreshJob::new(Arc::new(provider), config.base_currency.clone())
        .with_publisher(Arc::new(store));

    if args.once {
        if let Some(publication) = job.refresh().await {
            info!(rates = publication.conversion_rates.len(), "Rates refreshed");
        }
        return Ok(());
    }

    let schedule = DailySchedule::at_hour(config.refresh_hour_utc)?;
    info!(
        output = %config.output_path.display(),
        hour_utc = config.refresh_hour_utc,
        "Starting rate refresher"
    );

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(()).await;
        }
    });

    job.run(schedule, shutdown_rx).await;

    info!("Rate refresher shutdown complete");
    Ok(())
}
