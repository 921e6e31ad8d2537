//! Rate provider trait and the exchangerate-api implementation.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{RatesError, RatesResult};
use crate::publisher::RatePublication;

/// Trait for upstream sources of daily exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the latest rates relative to `base`.
    async fn fetch_latest(&self, base: &str) -> RatesResult<RatePublication>;
}

/// Body of `GET /v6/{key}/latest/{base}`.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    base_code: Option<String>,
    time_last_update_unix: Option<i64>,
    conversion_rates: Option<BTreeMap<String, Decimal>>,
}

/// Parse a latest-rates response body into a publication.
pub fn parse_latest_response(body: &[u8]) -> RatesResult<RatePublication> {
    let response: LatestRatesResponse = serde_json::from_slice(body)?;

    if response.result != "success" {
        return Err(RatesError::Provider(
            response.error_type.unwrap_or(response.result),
        ));
    }

    let timestamp = response
        .time_last_update_unix
        .ok_or_else(|| RatesError::MalformedResponse("missing time_last_update_unix".into()))?;
    let last_updated = Utc
        .timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| RatesError::MalformedResponse(format!("bad timestamp {}", timestamp)))?;
    let conversion_rates = response
        .conversion_rates
        .ok_or_else(|| RatesError::MalformedResponse("missing conversion_rates".into()))?;

    let mut publication = RatePublication::new(last_updated, conversion_rates);
    if let Some(base) = response.base_code {
        publication.base = base;
    }
    Ok(publication)
}

/// Client for <https://www.exchangerate-api.com>.
pub struct ExchangeRateApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiProvider {
    /// Create a provider with a request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> RatesResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn latest_url(&self, base: &str) -> String {
        format!("{}/{}/latest/{}", self.base_url, self.api_key, base)
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        "exchangerate-api"
    }

    #[instrument(skip(self))]
    async fn fetch_latest(&self, base: &str) -> RatesResult<RatePublication> {
        let response = self.client.get(self.latest_url(base)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RatesError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let publication = parse_latest_response(&body)?;

        debug!(
            rates = publication.conversion_rates.len(),
            last_updated = %publication.last_updated,
            "Fetched latest rates"
        );
        Ok(publication)
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rates: dashmap::DashMap<String, Decimal>,
    failure: parking_lot::Mutex<Option<u16>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: dashmap::DashMap::new(),
            failure: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set the rate for a currency code.
    pub fn set_rate(&self, code: &str, rate: Decimal) {
        self.rates.insert(code.to_string(), rate);
    }

    /// Make every fetch fail with the given HTTP status, or succeed again.
    pub fn fail_with(&self, status: Option<u16>) {
        *self.failure.lock() = status;
    }

    /// Number of fetches attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_latest(&self, base: &str) -> RatesResult<RatePublication> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(status) = *self.failure.lock() {
            return Err(RatesError::HttpStatus(status));
        }

        let rates = self
            .rates
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        let mut publication = RatePublication::new(Utc::now(), rates);
        publication.base = base.to_string();
        Ok(publication)
    }
}
