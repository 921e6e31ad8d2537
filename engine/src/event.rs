//! Events fed to the conversion engine.

use converter_common::Currency;

/// Edits to the two-sided conversion form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// One-time seed of both currencies. Ignored if either is empty.
    InitialDataLoaded {
        from_currency: Currency,
        to_currency: Currency,
    },
    FromCurrencyChanged(Currency),
    ToCurrencyChanged(Currency),
    /// Raw text typed into the "from" amount field.
    FromAmountChanged(String),
    /// Raw text typed into the "to" amount field.
    ToAmountChanged(String),
}

/// Changes to the favorite currencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesEvent {
    FavoriteAdded(Currency),
    FavoriteRemoved(Currency),
}

/// Anything the presentation layer can send to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Form(FormEvent),
    Favorites(FavoritesEvent),
}

impl From<FormEvent> for EngineEvent {
    fn from(event: FormEvent) -> Self {
        EngineEvent::Form(event)
    }
}

impl From<FavoritesEvent> for EngineEvent {
    fn from(event: FavoritesEvent) -> Self {
        EngineEvent::Favorites(event)
    }
}
