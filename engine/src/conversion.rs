//! Amount conversion through the base currency.

use converter_common::{floor_to_cents, Currency, CurrencyCatalog, RateSnapshot};
use rust_decimal::Decimal;

use crate::error::ConversionError;
use crate::state::FavoriteValuation;

/// Convert `amount` of `from` into `to`.
///
/// Non-base currencies go through the base: `amount / rate(from) * rate(to)`.
/// The result is floor-truncated to cents so a converted amount is never
/// overstated. Identical currencies return `amount` untouched.
pub fn try_convert(
    amount: Decimal,
    from: &Currency,
    to: &Currency,
    snapshot: &RateSnapshot,
) -> Result<Decimal, ConversionError> {
    if from == to {
        return Ok(amount);
    }

    let base = snapshot.base();
    let rate = |currency: &Currency| {
        snapshot
            .rate(currency.code())
            .ok_or_else(|| ConversionError::MissingRate(currency.code().to_string()))
    };

    let base_amount = if from == base {
        amount
    } else {
        amount
            .checked_div(rate(from)?)
            .ok_or(ConversionError::Overflow)?
    };

    let result = if to == base {
        base_amount
    } else {
        base_amount
            .checked_mul(rate(to)?)
            .ok_or(ConversionError::Overflow)?
    };

    Ok(floor_to_cents(result))
}

/// [`try_convert`] where `None` means "not computable yet".
pub fn convert(
    amount: Decimal,
    from: &Currency,
    to: &Currency,
    snapshot: &RateSnapshot,
) -> Option<Decimal> {
    try_convert(amount, from, to, snapshot).ok()
}

/// Value one unit and `from_amount` units of `from` in each favorite.
///
/// Favorites are resolved through the catalog; unknown codes and
/// currencies without a rate are left out until they become computable.
pub fn favorite_valuations(
    favorite_codes: &[String],
    from: &Currency,
    from_amount: Decimal,
    snapshot: &RateSnapshot,
    catalog: &CurrencyCatalog,
) -> Vec<FavoriteValuation> {
    catalog
        .resolve_all(favorite_codes.iter().map(String::as_str))
        .into_iter()
        .filter_map(|favorite| {
            let exchange_rate = floor_to_cents(convert(Decimal::ONE, from, &favorite, snapshot)?);
            let result_amount = floor_to_cents(exchange_rate.checked_mul(from_amount)?);
            Some(FavoriteValuation {
                favorite_currency: favorite,
                base_currency: from.clone(),
                exchange_rate,
                result_amount,
            })
        })
        .collect()
}
