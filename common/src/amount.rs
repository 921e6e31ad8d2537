//! Amount text handling: parsing user input, floor-truncation and rendering.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::{CommonError, CommonResult};

/// Decimal places every converted amount is truncated to.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Largest amount accepted from user input.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(u32::MAX, u32::MAX, 0, false, 0);

/// Parse user-entered amount text.
///
/// Accepts digits with at most one decimal point, including partial input
/// such as `12.` or `.5`. Signs, exponents, separators and surrounding
/// whitespace are rejected, as is anything above [`MAX_AMOUNT`]. Blank text
/// is not an amount and is rejected too; callers treat blank as "no value"
/// before parsing.
pub fn parse_amount(text: &str) -> CommonResult<Decimal> {
    let invalid = || CommonError::InvalidAmount(text.to_string());

    let mut seen_point = false;
    let mut seen_digit = false;
    for ch in text.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return Err(invalid()),
        }
    }
    if !seen_digit {
        return Err(invalid());
    }

    let normalized = match (text.starts_with('.'), text.ends_with('.')) {
        (true, _) => format!("0{}", text),
        (false, true) => text[..text.len() - 1].to_string(),
        (false, false) => text.to_string(),
    };

    let amount = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    if amount > MAX_AMOUNT {
        return Err(invalid());
    }
    Ok(amount)
}

/// Whether text is acceptable in an amount field: blank, or a valid amount.
pub fn is_valid_amount_text(text: &str) -> bool {
    text.is_empty() || parse_amount(text).is_ok()
}

/// Truncate to two decimal places, never rounding up: `floor(x * 100) / 100`.
pub fn floor_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_DECIMAL_PLACES, RoundingStrategy::ToNegativeInfinity)
}

/// Render an amount the way it is written back into a form field: shortest
/// form, always with at least one fractional digit (`278.5`, `9.0`).
pub fn format_amount(value: Decimal) -> String {
    let value = value.normalize();
    if value.scale() == 0 {
        format!("{}.0", value)
    } else {
        value.to_string()
    }
}
