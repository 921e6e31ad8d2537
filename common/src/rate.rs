//! Exchange rates and rate snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::CurrencyCatalog;
use crate::currency::Currency;
use crate::error::{CommonError, CommonResult};

/// One unit of `base_currency` equals `rate` units of `target_currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base_currency: Currency,
    pub target_currency: Currency,
    pub rate: Decimal,
}

impl ExchangeRate {
    /// Create a rate. Rates must be strictly positive.
    pub fn new(base_currency: Currency, target_currency: Currency, rate: Decimal) -> CommonResult<Self> {
        if rate <= Decimal::ZERO {
            return Err(CommonError::InvalidRate {
                code: target_currency.code.clone(),
                rate: rate.to_string(),
            });
        }
        Ok(Self {
            base_currency,
            target_currency,
            rate,
        })
    }
}

/// Wholesale rate mapping keyed by target currency code, all quoted against
/// the same base. Never mutated after construction; a refresh builds a new
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    base: Currency,
    rates: HashMap<String, ExchangeRate>,
    last_updated: Option<DateTime<Utc>>,
}

impl RateSnapshot {
    /// Build a snapshot from `(code, rate)` pairs.
    ///
    /// Codes unknown to the catalog and non-positive rates are skipped. On
    /// duplicate codes the last pair wins.
    pub fn from_rates<I, S>(
        base: Currency,
        rates: I,
        catalog: &CurrencyCatalog,
        last_updated: Option<DateTime<Utc>>,
    ) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (code, rate) in rates {
            let Some(target) = catalog.lookup(code.as_ref()) else {
                continue;
            };
            if let Ok(rate) = ExchangeRate::new(base.clone(), target, rate) {
                map.insert(rate.target_currency.code.clone(), rate);
            }
        }

        Self {
            base,
            rates: map,
            last_updated,
        }
    }

    /// The currency every rate is quoted against.
    pub fn base(&self) -> &Currency {
        &self.base
    }

    /// Units of `code` per one unit of the base currency, if known.
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).map(|r| r.rate)
    }

    /// When the provider last updated these rates.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.rates.values()
    }
}
