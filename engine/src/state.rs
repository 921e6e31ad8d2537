//! Form and UI state published by the engine.

use converter_common::{Currency, RateSnapshot};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Which amount field the user edited last. The other one is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrivingField {
    #[default]
    From,
    To,
}

/// The two-sided conversion form.
///
/// Amounts are kept as the text the user sees so partial input such as
/// `12.` survives; non-blank amounts always parse to a number >= 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormState {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: String,
    pub to_amount: String,
    pub driving: DrivingField,
}

/// Value of the current "from" amount in one favorite currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteValuation {
    pub favorite_currency: Currency,
    /// The form's "from" currency.
    pub base_currency: Currency,
    /// Units of the favorite per one unit of the base currency.
    pub exchange_rate: Decimal,
    /// `exchange_rate` times the "from" amount (zero when blank).
    pub result_amount: Decimal,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    /// Waiting for the first rate snapshot.
    #[default]
    Loading,
    Ready {
        currencies: Vec<Currency>,
        rates: Arc<RateSnapshot>,
        favorites: Vec<FavoriteValuation>,
    },
}

impl UiState {
    pub fn is_ready(&self) -> bool {
        matches!(self, UiState::Ready { .. })
    }

    /// Favorite valuations, empty while loading.
    pub fn favorites(&self) -> &[FavoriteValuation] {
        match self {
            UiState::Loading => &[],
            UiState::Ready { favorites, .. } => favorites,
        }
    }
}
