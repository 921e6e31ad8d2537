//! The conversion state machine.
//!
//! [`ConversionEngine`] owns the form and the derived UI state and applies
//! one input at a time. It is synchronous and has no I/O; the
//! [`EngineService`](crate::service::EngineService) drives it from a task.

use std::sync::Arc;

use converter_common::{
    format_amount, is_valid_amount_text, parse_amount, Currency, CurrencyCatalog, RateSnapshot,
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::conversion::{favorite_valuations, try_convert};
use crate::error::ConversionError;
use crate::event::FormEvent;
use crate::state::{DrivingField, FormState, UiState};

/// Form state plus the context it is computed against.
pub struct ConversionEngine {
    catalog: CurrencyCatalog,
    form: FormState,
    rates: Option<Arc<RateSnapshot>>,
    favorite_codes: Vec<String>,
    ui: UiState,
}

impl ConversionEngine {
    /// Create an engine with an empty form, waiting for rates.
    pub fn new(catalog: CurrencyCatalog) -> Self {
        Self {
            catalog,
            form: FormState::default(),
            rates: None,
            favorite_codes: Vec::new(),
            ui: UiState::Loading,
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn catalog(&self) -> &CurrencyCatalog {
        &self.catalog
    }

    pub fn rates(&self) -> Option<&Arc<RateSnapshot>> {
        self.rates.as_ref()
    }

    /// Apply a form edit. Returns whether the form changed.
    pub fn apply(&mut self, event: FormEvent) -> bool {
        let before = self.form.clone();

        match event {
            FormEvent::InitialDataLoaded {
                from_currency,
                to_currency,
            } => {
                if from_currency.is_empty() || to_currency.is_empty() {
                    debug!("Ignoring initial data with an empty currency");
                    return false;
                }
                self.form.from_currency = from_currency;
                self.form.to_currency = to_currency;
            }
            FormEvent::FromCurrencyChanged(currency) => {
                self.form.from_currency = currency;
                self.form.driving = DrivingField::From;
                self.derive_to_amount();
            }
            FormEvent::ToCurrencyChanged(currency) => {
                self.form.to_currency = currency;
                self.form.driving = DrivingField::From;
                self.derive_to_amount();
            }
            FormEvent::FromAmountChanged(text) => {
                if !is_valid_amount_text(&text) {
                    debug!(text = %text, "Dropping invalid from-amount");
                    return false;
                }
                self.form.from_amount = text;
                self.form.driving = DrivingField::From;
                self.derive_to_amount();
            }
            FormEvent::ToAmountChanged(text) => {
                if !is_valid_amount_text(&text) {
                    debug!(text = %text, "Dropping invalid to-amount");
                    return false;
                }
                self.form.to_amount = text;
                self.form.driving = DrivingField::To;
                self.derive_from_amount();
            }
        }

        self.refresh_ui();
        self.form != before
    }

    /// Replace the rate snapshot and recompute everything derived from it.
    pub fn set_rates(&mut self, rates: Arc<RateSnapshot>) {
        self.rates = Some(rates);
        match self.form.driving {
            DrivingField::From => self.derive_to_amount(),
            DrivingField::To => self.derive_from_amount(),
        }
        self.refresh_ui();
    }

    /// Replace the favorite codes and recompute their valuations.
    pub fn set_favorites(&mut self, codes: Vec<String>) {
        self.favorite_codes = codes;
        self.refresh_ui();
    }

    fn derive_to_amount(&mut self) {
        if self.form.from_amount.is_empty() {
            self.form.to_amount.clear();
            return;
        }
        if let Some(text) = self.derived(
            &self.form.from_amount,
            &self.form.from_currency,
            &self.form.to_currency,
        ) {
            self.form.to_amount = text;
        }
    }

    fn derive_from_amount(&mut self) {
        if self.form.to_amount.is_empty() {
            self.form.from_amount.clear();
            return;
        }
        if let Some(text) = self.derived(
            &self.form.to_amount,
            &self.form.to_currency,
            &self.form.from_currency,
        ) {
            self.form.from_amount = text;
        }
    }

    /// Text for the derived field, or `None` to keep its previous value.
    ///
    /// A result too large to represent clears the field so it never shows a
    /// value computed from an older driving amount.
    fn derived(&self, text: &str, from: &Currency, to: &Currency) -> Option<String> {
        let amount = parse_amount(text).ok()?;
        let rates = self.rates.as_deref()?;
        match try_convert(amount, from, to, rates) {
            Ok(result) => Some(format_amount(result)),
            Err(ConversionError::MissingRate(code)) => {
                debug!(code = %code, "Rate not available yet, keeping previous amount");
                None
            }
            Err(ConversionError::Overflow) => {
                warn!(from = %from, to = %to, amount = %text, "Conversion overflowed, clearing result");
                Some(String::new())
            }
        }
    }

    fn refresh_ui(&mut self) {
        let Some(rates) = self.rates.clone() else {
            return;
        };

        let from_amount = parse_amount(&self.form.from_amount).unwrap_or(Decimal::ZERO);
        let favorites = favorite_valuations(
            &self.favorite_codes,
            &self.form.from_currency,
            from_amount,
            &rates,
            &self.catalog,
        );

        self.ui = UiState::Ready {
            currencies: self.catalog.currencies().to_vec(),
            rates,
            favorites,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn catalog() -> CurrencyCatalog {
        CurrencyCatalog::supported()
    }

    fn currency(code: &str) -> Currency {
        catalog().lookup(code).unwrap()
    }

    fn rates(pairs: &[(&str, Decimal)]) -> Arc<RateSnapshot> {
        let catalog = catalog();
        Arc::new(RateSnapshot::from_rates(
            catalog.lookup("USD").unwrap(),
            pairs.iter().map(|(c, r)| (*c, *r)),
            &catalog,
            None,
        ))
    }

    fn engine(from: &str, to: &str, pairs: &[(&str, Decimal)]) -> ConversionEngine {
        let mut engine = ConversionEngine::new(catalog());
        engine.set_rates(rates(pairs));
        engine.apply(FormEvent::InitialDataLoaded {
            from_currency: currency(from),
            to_currency: currency(to),
        });
        engine
    }

    fn usd_pkr() -> Vec<(&'static str, Decimal)> {
        vec![("USD", dec!(1.0)), ("PKR", dec!(278.5))]
    }

    #[test]
    fn test_usd_to_pkr_scenario() {
        let mut engine = engine("USD", "PKR", &usd_pkr());

        engine.apply(FormEvent::FromAmountChanged("1".into()));

        assert_eq!(engine.form().from_amount, "1");
        assert_eq!(engine.form().to_amount, "278.5");
    }

    #[test]
    fn test_pkr_to_usd_scenario() {
        let mut engine = engine("PKR", "USD", &usd_pkr());

        engine.apply(FormEvent::FromAmountChanged("278.5".into()));

        assert_eq!(engine.form().to_amount, "1.0");
    }

    #[test]
    fn test_to_amount_drives_from_amount() {
        let mut engine = engine("USD", "PKR", &usd_pkr());

        engine.apply(FormEvent::ToAmountChanged("557".into()));

        assert_eq!(engine.form().to_amount, "557");
        assert_eq!(engine.form().from_amount, "2.0");
        assert_eq!(engine.form().driving, DrivingField::To);
    }

    #[test]
    fn test_invalid_amount_dropped() {
        let mut engine = engine("USD", "PKR", &usd_pkr());
        engine.apply(FormEvent::FromAmountChanged("2".into()));
        let before = engine.form().clone();

        for text in ["-1", "abc", "1.2.3", "1e3"] {
            assert!(!engine.apply(FormEvent::FromAmountChanged(text.into())));
            assert!(!engine.apply(FormEvent::ToAmountChanged(text.into())));
        }

        assert_eq!(engine.form(), &before);
    }

    #[test]
    fn test_partial_input_kept_verbatim() {
        let mut engine = engine("USD", "PKR", &usd_pkr());

        engine.apply(FormEvent::FromAmountChanged("2.".into()));

        assert_eq!(engine.form().from_amount, "2.");
        assert_eq!(engine.form().to_amount, "557.0");
    }

    #[test]
    fn test_blank_from_amount_clears_both() {
        let mut engine = engine("USD", "PKR", &usd_pkr());
        engine.apply(FormEvent::FromAmountChanged("3".into()));

        engine.apply(FormEvent::FromAmountChanged(String::new()));

        assert_eq!(engine.form().from_amount, "");
        assert_eq!(engine.form().to_amount, "");
    }

    #[test]
    fn test_blank_to_amount_clears_both() {
        let mut engine = engine("USD", "PKR", &usd_pkr());
        engine.apply(FormEvent::ToAmountChanged("278.5".into()));

        engine.apply(FormEvent::ToAmountChanged(String::new()));

        assert_eq!(engine.form().from_amount, "");
        assert_eq!(engine.form().to_amount, "");
    }

    #[test]
    fn test_blank_propagates_without_rates() {
        let mut engine = ConversionEngine::new(catalog());
        engine.form.to_amount = "42.0".into();

        engine.apply(FormEvent::FromAmountChanged(String::new()));

        assert_eq!(engine.form().to_amount, "");
    }

    #[test]
    fn test_missing_rate_keeps_previous_amount() {
        let mut engine = engine("USD", "EUR", &[("EUR", dec!(0.9))]);
        engine.apply(FormEvent::FromAmountChanged("10".into()));
        assert_eq!(engine.form().to_amount, "9.0");

        engine.apply(FormEvent::ToCurrencyChanged(currency("PKR")));
        assert_eq!(engine.form().to_amount, "9.0");

        engine.apply(FormEvent::FromAmountChanged("20".into()));
        assert_eq!(engine.form().from_amount, "20");
        assert_eq!(engine.form().to_amount, "9.0");
    }

    #[test]
    fn test_overflowing_result_clears_derived_amount() {
        let mut engine = engine("USD", "PKR", &[("PKR", dec!(10000000000))]);
        engine.apply(FormEvent::FromAmountChanged("1".into()));
        assert_eq!(engine.form().to_amount, "10000000000.0");

        assert!(engine.apply(FormEvent::FromAmountChanged("18446744073709551615".into())));

        assert_eq!(engine.form().from_amount, "18446744073709551615");
        assert_eq!(engine.form().to_amount, "");
    }

    #[test]
    fn test_amount_above_max_dropped() {
        let mut engine = engine("USD", "PKR", &usd_pkr());
        engine.apply(FormEvent::FromAmountChanged("1".into()));

        assert!(!engine.apply(FormEvent::FromAmountChanged(
            "1000000000000000000000000000".into()
        )));
        assert!(!engine.apply(FormEvent::FromAmountChanged("1".repeat(31))));

        assert_eq!(engine.form().from_amount, "1");
        assert_eq!(engine.form().to_amount, "278.5");
    }

    #[test]
    fn test_currency_change_recomputes_from_driving_side() {
        let mut engine = engine(
            "USD",
            "PKR",
            &[("PKR", dec!(278.5)), ("EUR", dec!(0.9))],
        );

        engine.apply(FormEvent::FromAmountChanged("10".into()));
        engine.apply(FormEvent::ToCurrencyChanged(currency("EUR")));

        assert_eq!(engine.form().to_currency.code, "EUR");
        assert_eq!(engine.form().to_amount, "9.0");
    }

    #[test]
    fn test_currency_change_resets_driving_to_from() {
        let mut engine = engine(
            "USD",
            "PKR",
            &[("PKR", dec!(278.5)), ("EUR", dec!(0.5))],
        );
        engine.apply(FormEvent::ToAmountChanged("557".into()));
        assert_eq!(engine.form().from_amount, "2.0");

        engine.apply(FormEvent::FromCurrencyChanged(currency("EUR")));

        // 2 EUR = 4 USD = 1114 PKR
        assert_eq!(engine.form().driving, DrivingField::From);
        assert_eq!(engine.form().from_amount, "2.0");
        assert_eq!(engine.form().to_amount, "1114.0");
    }

    #[test]
    fn test_currency_change_with_blank_amount() {
        let mut engine = engine("USD", "PKR", &usd_pkr());

        engine.apply(FormEvent::ToCurrencyChanged(currency("USD")));

        assert_eq!(engine.form().from_amount, "");
        assert_eq!(engine.form().to_amount, "");
    }

    #[test]
    fn test_initial_data_ignored_with_empty_currency() {
        let mut engine = ConversionEngine::new(catalog());

        assert!(!engine.apply(FormEvent::InitialDataLoaded {
            from_currency: currency("USD"),
            to_currency: Currency::empty(),
        }));
        assert!(engine.form().from_currency.is_empty());

        assert!(engine.apply(FormEvent::InitialDataLoaded {
            from_currency: currency("USD"),
            to_currency: currency("PKR"),
        }));
        assert_eq!(engine.form().to_currency.code, "PKR");
    }

    #[test]
    fn test_initial_data_does_not_convert() {
        let mut engine = ConversionEngine::new(catalog());
        engine.set_rates(rates(&usd_pkr()));
        engine.form.from_amount = "1".into();

        engine.apply(FormEvent::InitialDataLoaded {
            from_currency: currency("USD"),
            to_currency: currency("PKR"),
        });

        assert_eq!(engine.form().to_amount, "");
    }

    #[test]
    fn test_empty_currency_conversion_is_noop() {
        let mut engine = ConversionEngine::new(catalog());
        engine.set_rates(rates(&usd_pkr()));
        engine.apply(FormEvent::ToCurrencyChanged(currency("PKR")));

        engine.apply(FormEvent::FromAmountChanged("5".into()));

        assert_eq!(engine.form().from_amount, "5");
        assert_eq!(engine.form().to_amount, "");
    }

    #[test]
    fn test_ui_loading_until_rates() {
        let mut engine = ConversionEngine::new(catalog());
        engine.set_favorites(vec!["EUR".into()]);
        assert_eq!(engine.ui(), &UiState::Loading);

        engine.set_rates(rates(&usd_pkr()));
        assert!(engine.ui().is_ready());

        engine.set_rates(rates(&[]));
        assert!(engine.ui().is_ready());
    }

    #[test]
    fn test_ready_state_contents() {
        let engine = engine("USD", "PKR", &usd_pkr());

        match engine.ui() {
            UiState::Ready {
                currencies, rates, ..
            } => {
                assert_eq!(currencies.len(), catalog().len());
                assert_eq!(rates.rate("PKR"), Some(dec!(278.5)));
            }
            UiState::Loading => panic!("expected ready state"),
        }
    }

    #[test]
    fn test_new_rates_recompute_derived_amount() {
        let mut engine = engine("USD", "EUR", &[("PKR", dec!(278.5))]);
        engine.apply(FormEvent::FromAmountChanged("10".into()));
        assert_eq!(engine.form().to_amount, "");

        engine.set_rates(rates(&[("EUR", dec!(0.9))]));

        assert_eq!(engine.form().to_amount, "9.0");
    }

    #[test]
    fn test_favorites_valuation() {
        let mut engine = engine("USD", "PKR", &[("PKR", dec!(278.5)), ("EUR", dec!(2.0))]);
        engine.apply(FormEvent::FromAmountChanged("5".into()));

        engine.set_favorites(vec!["EUR".into()]);

        let favorites = engine.ui().favorites();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].favorite_currency.code, "EUR");
        assert_eq!(favorites[0].exchange_rate, dec!(2.0));
        assert_eq!(favorites[0].result_amount, dec!(10.0));
    }

    #[test]
    fn test_favorites_follow_form_changes() {
        let mut engine = engine("USD", "PKR", &[("PKR", dec!(278.5)), ("EUR", dec!(2.0))]);
        engine.set_favorites(vec!["EUR".into(), "PKR".into()]);
        assert_eq!(engine.ui().favorites()[0].result_amount, dec!(0));

        engine.apply(FormEvent::FromAmountChanged("3".into()));
        let favorites = engine.ui().favorites();
        assert_eq!(favorites[0].result_amount, dec!(6.0));
        assert_eq!(favorites[1].result_amount, dec!(835.5));

        engine.apply(FormEvent::FromCurrencyChanged(currency("EUR")));
        let favorites = engine.ui().favorites();
        assert_eq!(favorites[0].base_currency.code, "EUR");
        assert_eq!(favorites[0].exchange_rate, dec!(1));
        assert_eq!(favorites[1].exchange_rate, dec!(139.25));
    }
}
