//! Conversion engine configuration.

use converter_common::CurrencyCatalog;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the engine service and the terminal front end.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Currency the form starts converting from.
    pub default_from: String,
    /// Currency the form starts converting to.
    pub default_to: String,
    /// Where favorites are persisted; in-memory when unset.
    pub favorites_path: Option<PathBuf>,
    /// Rate file written by the refresher.
    pub rates_path: PathBuf,
    /// Quiet period before a currency search query is evaluated.
    pub search_debounce: Duration,
    /// Capacity of the engine's event queue.
    pub event_buffer: usize,
    /// Log level.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_from: "USD".to_string(),
            default_to: "PKR".to_string(),
            favorites_path: None,
            rates_path: PathBuf::from("rates.json"),
            search_debounce: Duration::from_millis(300),
            event_buffer: 64,
            log_level: "warn".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(code) = std::env::var("DEFAULT_FROM_CURRENCY") {
            config.default_from = code.to_uppercase();
        }

        if let Ok(code) = std::env::var("DEFAULT_TO_CURRENCY") {
            config.default_to = code.to_uppercase();
        }

        if let Ok(path) = std::env::var("FAVORITES_PATH") {
            config.favorites_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("RATES_PATH") {
            config.rates_path = PathBuf::from(path);
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration against the catalog.
    pub fn validate(&self, catalog: &CurrencyCatalog) -> Result<(), String> {
        if !catalog.contains(&self.default_from) {
            return Err(format!("Unknown default from-currency {}", self.default_from));
        }

        if !catalog.contains(&self.default_to) {
            return Err(format!("Unknown default to-currency {}", self.default_to));
        }

        if self.event_buffer == 0 {
            return Err("Event buffer cannot be 0".to_string());
        }

        Ok(())
    }
}
