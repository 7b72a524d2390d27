//! Currency formatting
//!
//! Amounts are stored in minor units (cents). Rendering follows en-US
//! currency formatting: symbol prefix, comma grouping, and always exactly two
//! fraction digits regardless of the currency's own exponent.

/// en-US symbols for currencies that have one; others fall back to the code.
const SYMBOLS: &[(&str, &str)] = &[
    ("usd", "$"),
    ("eur", "€"),
    ("gbp", "£"),
    ("jpy", "¥"),
    ("cny", "CN¥"),
    ("inr", "₹"),
    ("krw", "₩"),
    ("ils", "₪"),
    ("vnd", "₫"),
    ("php", "₱"),
    ("brl", "R$"),
    ("cad", "CA$"),
    ("aud", "A$"),
    ("nzd", "NZ$"),
    ("hkd", "HK$"),
    ("mxn", "MX$"),
    ("twd", "NT$"),
    ("xcd", "EC$"),
    ("xaf", "FCFA"),
];

/// Look up the en-US symbol for a currency code (case-insensitive)
pub fn currency_symbol(currency: &str) -> Option<&'static str> {
    let code = currency.to_ascii_lowercase();
    SYMBOLS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, symbol)| *symbol)
}

/// Format a minor-unit amount as a currency string
///
/// `format_currency(1999, "usd")` is `"$19.99"`. Currencies without an en-US
/// symbol render as the upper-case code followed by a no-break space, e.g.
/// `"CHF\u{a0}19.99"`.
pub fn format_currency(unit_amount: i64, currency: &str) -> String {
    let negative = unit_amount < 0;
    let abs = unit_amount.unsigned_abs();
    let whole = group_thousands(abs / 100);
    let cents = abs % 100;

    let prefix = match currency_symbol(currency) {
        Some(symbol) => symbol.to_string(),
        None => format!("{}\u{a0}", currency.to_ascii_uppercase()),
    };
    let sign = if negative { "-" } else { "" };

    format!("{sign}{prefix}{whole}.{cents:02}")
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
