//! Rate refresher configuration.

use converter_common::BASE_CURRENCY_CODE;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the rate refresh job.
#[derive(Debug, Clone)]
pub struct RefresherConfig {
    /// Key for the exchangerate-api service.
    pub api_key: String,
    /// Base URL of the rate API, without the key.
    pub api_base_url: String,
    /// Currency all rates are quoted against.
    pub base_currency: String,
    /// Where the latest rates are stored.
    pub output_path: PathBuf,
    /// HTTP request timeout.
    pub request_timeout: Duration,
    /// Hour of day (UTC) the refresh runs.
    pub refresh_hour_utc: u32,
    /// Log level.
    pub log_level: String,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://v6.exchangerate-api.com/v6".to_string(),
            base_currency: BASE_CURRENCY_CODE.to_string(),
            output_path: PathBuf::from("rates.json"),
            request_timeout: Duration::from_secs(30),
            refresh_hour_utc: 0,
            log_level: "info".to_string(),
        }
    }
}

impl RefresherConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("EXCHANGE_RATE_API") {
            config.api_key = key;
        }

        if let Ok(url) = std::env::var("EXCHANGE_RATE_API_URL") {
            config.api_base_url = url;
        }

        if let Ok(path) = std::env::var("RATES_OUTPUT_PATH") {
            config.output_path = PathBuf::from(path);
        }

        if let Ok(secs) = std::env::var("RATES_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(hour) = std::env::var("RATES_REFRESH_HOUR_UTC") {
            if let Ok(hour) = hour.parse() {
                config.refresh_hour_utc = hour;
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("API key cannot be empty (set EXCHANGE_RATE_API)".to_string());
        }

        if self.api_base_url.is_empty() {
            return Err("API base URL cannot be empty".to_string());
        }

        if self.base_currency != BASE_CURRENCY_CODE {
            return Err(format!("Base currency must be {}", BASE_CURRENCY_CODE));
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        if self.refresh_hour_utc > 23 {
            return Err("Refresh hour must be between 0 and 23".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RefresherConfig {
        RefresherConfig {
            api_key: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_needs_key() {
        assert!(RefresherConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = valid();
        config.refresh_hour_utc = 24;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.base_currency = "EUR".to_string();
        assert!(config.validate().is_err());
    }
}
