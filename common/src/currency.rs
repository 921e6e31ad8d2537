//! Currency value type.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Code of the fixed reference currency all stored rates are expressed in.
pub const BASE_CURRENCY_CODE: &str = "USD";

/// A currency with its display metadata.
///
/// Identity is the ISO 4217 code: two values with the same code are equal
/// regardless of name, symbol or flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 currency code.
    pub code: String,
    /// Display name, e.g. "Pakistani Rupee".
    pub name: String,
    /// Graphical symbol, e.g. "₨".
    pub symbol: String,
    /// Reference to the flag image shown next to the currency.
    pub flag_url: String,
}

impl Currency {
    /// Create a new currency. The code is stored upper-case.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        let code = code.into().to_uppercase();
        let flag_url = flag_url_for(&code);
        Self {
            code,
            name: name.into(),
            symbol: symbol.into(),
            flag_url,
        }
    }

    /// The "not yet selected" sentinel.
    pub fn empty() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            symbol: String::new(),
            flag_url: String::new(),
        }
    }

    /// Whether this is the [`Currency::empty`] sentinel.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl PartialOrd for Currency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Currency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code.cmp(&other.code)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Flag image for a currency code.
///
/// The first two letters of an ISO 4217 code are the issuing country's
/// ISO 3166 code (`EU` for the euro).
fn flag_url_for(code: &str) -> String {
    if code.len() < 2 {
        return String::new();
    }
    let country: String = code.chars().take(2).collect::<String>().to_lowercase();
    format!("https://flagcdn.com/w80/{}.png", country)
}
