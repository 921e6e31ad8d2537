//! Rate publications and the sinks they are published to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use converter_common::BASE_CURRENCY_CODE;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::RatesResult;

/// One refresh worth of rates: the provider's update time and the full
/// mapping of units per one unit of `base`.
///
/// Timestamp and mapping always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePublication {
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_updated: DateTime<Utc>,
    pub conversion_rates: BTreeMap<String, Decimal>,
}

fn default_base() -> String {
    BASE_CURRENCY_CODE.to_string()
}

impl RatePublication {
    /// Create a publication against the fixed base currency.
    pub fn new(last_updated: DateTime<Utc>, conversion_rates: BTreeMap<String, Decimal>) -> Self {
        Self {
            base: default_base(),
            last_updated,
            conversion_rates,
        }
    }
}

/// A destination for freshly fetched rates.
#[async_trait]
pub trait RatePublisher: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Replace whatever this sink holds with the publication.
    async fn publish(&self, publication: &RatePublication) -> RatesResult<()>;
}
