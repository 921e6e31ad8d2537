//! Scheduled fetch-and-publish job.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use crate::error::{RatesError, RatesResult};
use crate::provider::RateProvider;
use crate::publisher::{RatePublication, RatePublisher};
use crate::schedule::DailySchedule;

/// Fetches the latest rates from a provider and publishes them to every sink.
///
/// A failed cycle is logged and skipped; the next scheduled run is the retry.
pub struct RefreshJob {
    provider: Arc<dyn RateProvider>,
    publishers: Vec<Arc<dyn RatePublisher>>,
    base: String,
}

impl RefreshJob {
    /// Create a job fetching rates relative to `base`.
    pub fn new(provider: Arc<dyn RateProvider>, base: impl Into<String>) -> Self {
        Self {
            provider,
            publishers: Vec::new(),
            base: base.into(),
        }
    }

    /// Add a sink that receives every successful fetch.
    pub fn with_publisher(mut self, publisher: Arc<dyn RatePublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// Run a single fetch-and-publish cycle.
    ///
    /// Every publisher is attempted; the first publisher error is returned
    /// after all have been tried.
    #[instrument(skip(self), fields(provider = self.provider.name(), base = %self.base))]
    pub async fn run_once(&self) -> RatesResult<RatePublication> {
        let publication = self.provider.fetch_latest(&self.base).await?;

        let mut first_error: Option<RatesError> = None;
        for publisher in &self.publishers {
            if let Err(e) = publisher.publish(&publication).await {
                error!(publisher = publisher.name(), error = %e, "Failed to publish rates");
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            rates = publication.conversion_rates.len(),
            last_updated = %publication.last_updated,
            "Rates refreshed"
        );
        Ok(publication)
    }

    /// Run one cycle, logging instead of returning failures.
    pub async fn refresh(&self) -> Option<RatePublication> {
        match self.run_once().await {
            Ok(publication) => Some(publication),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "Rate refresh failed, waiting for next scheduled run");
                None
            }
            Err(e) => {
                error!(error = %e, "Rate refresh failed, waiting for next scheduled run");
                None
            }
        }
    }

    /// Run on `schedule` until a shutdown signal arrives.
    pub async fn run(&self, schedule: DailySchedule, mut shutdown_rx: mpsc::Receiver<()>) {
        loop {
            let now = Utc::now();
            let next = schedule.next_after(now);
            info!(next_run = %next, "Waiting for next rate refresh");

            tokio::select! {
                _ = tokio::time::sleep(schedule.until_next(now)) => {
                    self.refresh().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Rate refresh job stopping");
                    break;
                }
            }
        }
    }
}
