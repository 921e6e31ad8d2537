//! Currency Converter Rate Source
//!
//! Exchange rates relative to USD, refreshed once a day.
//!
//! # Features
//!
//! - Live snapshot feed the conversion engine subscribes to
//! - Rate provider trait with an exchangerate-api client
//! - Daily refresh job publishing to the feed and to a JSON file
//!
//! # Example
//!
//! ```rust,ignore
//! use converter_rates::{DailySchedule, ExchangeRateApiProvider, JsonFileRateStore, RefreshJob};
//!
//! let provider = ExchangeRateApiProvider::new(url, key, timeout)?;
//! let job = RefreshJob::new(Arc::new(provider), "USD")
//!     .with_publisher(Arc::new(JsonFileRateStore::new("rates.json")));
//!
//! job.run(DailySchedule::midnight(), shutdown_rx).await;
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod job;
pub mod provider;
pub mod publisher;
pub mod schedule;
pub mod store;

pub use config::RefresherConfig;
pub use error::{RatesError, RatesResult};
pub use feed::{RateFeed, SnapshotReceiver};
pub use job::RefreshJob;
pub use provider::{ExchangeRateApiProvider, RateProvider};
pub use publisher::{RatePublication, RatePublisher};
pub use schedule::DailySchedule;
pub use store::{write_atomic, JsonFileRateStore};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
