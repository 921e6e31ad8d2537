//! Static catalog of supported currencies.

use std::collections::HashMap;

use crate::currency::Currency;

/// Code, name and symbol of every supported currency, ordered by code.
const SUPPORTED_CURRENCIES: &[(&str, &str, &str)] = &[
    ("AED", "United Arab Emirates Dirham", "د.إ"),
    ("ARS", "Argentine Peso", "$"),
    ("AUD", "Australian Dollar", "$"),
    ("BDT", "Bangladeshi Taka", "৳"),
    ("BHD", "Bahraini Dinar", ".د.ب"),
    ("BRL", "Brazilian Real", "R$"),
    ("CAD", "Canadian Dollar", "$"),
    ("CHF", "Swiss Franc", "CHF"),
    ("CLP", "Chilean Peso", "$"),
    ("CNY", "Chinese Yuan", "¥"),
    ("CZK", "Czech Koruna", "Kč"),
    ("DKK", "Danish Krone", "kr"),
    ("EGP", "Egyptian Pound", "E£"),
    ("EUR", "Euro", "€"),
    ("GBP", "British Pound", "£"),
    ("HKD", "Hong Kong Dollar", "$"),
    ("HUF", "Hungarian Forint", "Ft"),
    ("IDR", "Indonesian Rupiah", "Rp"),
    ("ILS", "Israeli New Shekel", "₪"),
    ("INR", "Indian Rupee", "₹"),
    ("JPY", "Japanese Yen", "¥"),
    ("KRW", "South Korean Won", "₩"),
    ("KWD", "Kuwaiti Dinar", "د.ك"),
    ("LKR", "Sri Lankan Rupee", "Rs"),
    ("MXN", "Mexican Peso", "$"),
    ("MYR", "Malaysian Ringgit", "RM"),
    ("NGN", "Nigerian Naira", "₦"),
    ("NOK", "Norwegian Krone", "kr"),
    ("NZD", "New Zealand Dollar", "$"),
    ("OMR", "Omani Rial", "ر.ع."),
    ("PHP", "Philippine Peso", "₱"),
    ("PKR", "Pakistani Rupee", "₨"),
    ("PLN", "Polish Złoty", "zł"),
    ("QAR", "Qatari Riyal", "ر.ق"),
    ("RON", "Romanian Leu", "lei"),
    ("SAR", "Saudi Riyal", "﷼"),
    ("SEK", "Swedish Krona", "kr"),
    ("SGD", "Singapore Dollar", "$"),
    ("THB", "Thai Baht", "฿"),
    ("TRY", "Turkish Lira", "₺"),
    ("TWD", "New Taiwan Dollar", "NT$"),
    ("UAH", "Ukrainian Hryvnia", "₴"),
    ("USD", "United States Dollar", "$"),
    ("VND", "Vietnamese Đồng", "₫"),
    ("ZAR", "South African Rand", "R"),
];

/// Lookup table from currency code to display metadata.
///
/// Pure lookup, no state beyond construction.
#[derive(Debug, Clone)]
pub struct CurrencyCatalog {
    currencies: Vec<Currency>,
    index: HashMap<String, usize>,
}

impl CurrencyCatalog {
    /// Catalog of every currency the converter supports.
    pub fn supported() -> Self {
        Self::from_currencies(
            SUPPORTED_CURRENCIES
                .iter()
                .map(|(code, name, symbol)| Currency::new(*code, *name, *symbol)),
        )
    }

    /// Build a catalog from arbitrary currencies. Sorted by code; the last
    /// entry wins on duplicate codes. The empty sentinel is never catalogued.
    pub fn from_currencies(currencies: impl IntoIterator<Item = Currency>) -> Self {
        let mut by_code: HashMap<String, Currency> = HashMap::new();
        for currency in currencies.into_iter().filter(|c| !c.is_empty()) {
            by_code.insert(currency.code.clone(), currency);
        }

        let mut currencies: Vec<Currency> = by_code.into_values().collect();
        currencies.sort();

        let index = currencies
            .iter()
            .enumerate()
            .map(|(i, c)| (c.code.clone(), i))
            .collect();

        Self { currencies, index }
    }

    /// Look up a currency by code (case-insensitive).
    pub fn lookup(&self, code: &str) -> Option<Currency> {
        self.index
            .get(&code.trim().to_uppercase())
            .map(|&i| self.currencies[i].clone())
    }

    /// Whether the catalog knows the code.
    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(&code.trim().to_uppercase())
    }

    /// All supported currencies in code order.
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Resolve codes to currencies, keeping order and skipping unknown codes.
    pub fn resolve_all<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> Vec<Currency> {
        codes.into_iter().filter_map(|code| self.lookup(code)).collect()
    }

    /// Currencies whose name or code contains the query, ignoring case and
    /// surrounding whitespace. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<Currency> {
        let needle = query.trim().to_lowercase();
        self.currencies
            .iter()
            .filter(|c| {
                needle.is_empty()
                    || c.name.to_lowercase().contains(&needle)
                    || c.code.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

impl Default for CurrencyCatalog {
    fn default() -> Self {
        Self::supported()
    }
}
