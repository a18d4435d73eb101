use serde::{Deserialize, Serialize};

/// Where the currency symbol is printed relative to the amount
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Before,
    After,
}

/// A currency as used for display. Amounts are always carried in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Currency {
    pub code: String,
    pub symbol: String,
    pub position: SymbolPosition,
    pub decimal_places: u32,
}

impl Currency {
    pub fn new(code: &str, symbol: &str, position: SymbolPosition, decimal_places: u32) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
            position,
            decimal_places,
        }
    }

    pub fn usd() -> Self {
        Self::new("USD", "$", SymbolPosition::Before, 2)
    }

    pub fn eur() -> Self {
        Self::new("EUR", "€", SymbolPosition::After, 2)
    }

    /// Resolve one of the known ISO codes
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Some(Self::usd()),
            "EUR" => Some(Self::eur()),
            "GBP" => Some(Self::new("GBP", "£", SymbolPosition::Before, 2)),
            "CHF" => Some(Self::new("CHF", "CHF", SymbolPosition::After, 2)),
            "JPY" => Some(Self::new("JPY", "¥", SymbolPosition::Before, 0)),
            _ => None,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

/// Thousands and decimal separators for a language code such as `fr_FR`
fn separators(lang: Option<&str>) -> (char, char) {
    let prefix = lang
        .and_then(|l| l.split(['_', '-']).next())
        .unwrap_or("en");

    match prefix {
        "fr" => ('\u{202f}', ','),
        "de" | "es" | "it" | "nl" | "pt" | "id" => ('.', ','),
        _ => (',', '.'),
    }
}

fn group_thousands(value: u64, separator: char) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Format an amount given in minor units for display in `lang`.
///
/// The symbol is separated from the number by a non-breaking space so that
/// mail clients never wrap it onto its own line.
pub fn format_amount(amount: i64, currency: &Currency, lang: Option<&str>) -> String {
    let (thousands, decimal) = separators(lang);
    let scale = 10u64.pow(currency.decimal_places);
    let abs = amount.unsigned_abs();

    let mut number = group_thousands(abs / scale, thousands);
    if currency.decimal_places > 0 {
        number.push(decimal);
        number.push_str(&format!(
            "{:0width$}",
            abs % scale,
            width = currency.decimal_places as usize
        ));
    }
    if amount < 0 {
        number.insert(0, '-');
    }

    match currency.position {
        SymbolPosition::Before => format!("{}\u{a0}{}", currency.symbol, number),
        SymbolPosition::After => format!("{}\u{a0}{}", number, currency.symbol),
    }
}
