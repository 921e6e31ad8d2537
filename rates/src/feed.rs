//! Live rate snapshot feed.
//!
//! The feed is the read side of the rate source: subscribers always observe
//! the most recently published snapshot and never block the publisher.

use async_trait::async_trait;
use converter_common::{CurrencyCatalog, RateSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::error::{RatesError, RatesResult};
use crate::publisher::{RatePublication, RatePublisher};

/// Latest snapshot as seen by subscribers; `None` until the first publication.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<RateSnapshot>>>;

/// In-process rate source backed by a watch channel.
pub struct RateFeed {
    catalog: CurrencyCatalog,
    tx: watch::Sender<Option<Arc<RateSnapshot>>>,
}

impl RateFeed {
    /// Create an empty feed resolving codes against `catalog`.
    pub fn new(catalog: CurrencyCatalog) -> Self {
        let (tx, _) = watch::channel(None);
        Self { catalog, tx }
    }

    /// Replace the current snapshot wholesale.
    pub fn publish_snapshot(&self, snapshot: RateSnapshot) {
        info!(
            rates = snapshot.len(),
            last_updated = ?snapshot.last_updated(),
            "Publishing rate snapshot"
        );
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Option<Arc<RateSnapshot>> {
        self.tx.borrow().clone()
    }

    /// Build a snapshot from a publication, keeping only catalog currencies.
    pub fn snapshot_from(&self, publication: &RatePublication) -> RatesResult<RateSnapshot> {
        let base = self
            .catalog
            .lookup(&publication.base)
            .ok_or_else(|| RatesError::UnknownBase(publication.base.clone()))?;

        Ok(RateSnapshot::from_rates(
            base,
            publication
                .conversion_rates
                .iter()
                .map(|(code, rate)| (code.as_str(), *rate)),
            &self.catalog,
            Some(publication.last_updated),
        ))
    }
}

#[async_trait]
impl RatePublisher for RateFeed {
    fn name(&self) -> &str {
        "feed"
    }

    async fn publish(&self, publication: &RatePublication) -> RatesResult<()> {
        let snapshot = self.snapshot_from(publication)?;
        self.publish_snapshot(snapshot);
        Ok(())
    }
}
