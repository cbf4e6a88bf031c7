//! # Currency Formatting
//!
//! Formats numbers as currency amounts using en-US conventions: `,` groups
//! thousands, `.` separates the fraction, and the minus sign precedes the
//! symbol (`-$1,234.50`).
//!
//! ## Example
//!
//! ```rust
//! use calc_core::currency::format_currency;
//!
//! assert_eq!(format_currency(1234.5, "USD").unwrap(), "$1,234.50");
//! assert_eq!(format_currency(1234.5, "jpy").unwrap(), "¥1,235");
//! assert_eq!(format_currency(2.0, "XYZ").unwrap(), "XYZ 2.00");
//! ```

use crate::errors::{CalcError, CalcResult};
use crate::numeric::round_to;

/// Symbol and minor-unit digits for a currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    /// Prefix printed before the amount
    pub symbol: &'static str,
    /// Number of fraction digits shown
    pub fraction_digits: usize,
}

/// Fraction digits used for codes without a table entry
const DEFAULT_FRACTION_DIGITS: usize = 2;

/// Currencies with a dedicated en-US symbol.
const KNOWN_CURRENCIES: &[(&str, CurrencyInfo)] = &[
    ("USD", CurrencyInfo { symbol: "$", fraction_digits: 2 }),
    ("EUR", CurrencyInfo { symbol: "€", fraction_digits: 2 }),
    ("GBP", CurrencyInfo { symbol: "£", fraction_digits: 2 }),
    ("JPY", CurrencyInfo { symbol: "¥", fraction_digits: 0 }),
    ("CNY", CurrencyInfo { symbol: "CN¥", fraction_digits: 2 }),
    ("INR", CurrencyInfo { symbol: "₹", fraction_digits: 2 }),
    ("CAD", CurrencyInfo { symbol: "CA$", fraction_digits: 2 }),
    ("AUD", CurrencyInfo { symbol: "A$", fraction_digits: 2 }),
    ("CHF", CurrencyInfo { symbol: "CHF ", fraction_digits: 2 }),
    ("KRW", CurrencyInfo { symbol: "₩", fraction_digits: 0 }),
    ("BRL", CurrencyInfo { symbol: "R$", fraction_digits: 2 }),
    ("MXN", CurrencyInfo { symbol: "MX$", fraction_digits: 2 }),
];

/// Look up a currency by ISO 4217 code (case-insensitive).
pub fn currency_info(code: &str) -> Option<CurrencyInfo> {
    let code = code.trim().to_ascii_uppercase();
    KNOWN_CURRENCIES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, info)| *info)
}

/// Format `value` as an amount in the currency `code`.
///
/// Codes must be three ASCII letters. Codes outside the symbol table are
/// printed as a prefix followed by a space, with two fraction digits.
pub fn format_currency(value: f64, code: &str) -> CalcResult<String> {
    let normalized = code.trim().to_ascii_uppercase();
    if normalized.len() != 3 || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CalcError::invalid_input(
            "currency_code",
            code,
            "Currency codes are three ASCII letters (ISO 4217)",
        ));
    }
    if !value.is_finite() {
        return Err(CalcError::invalid_input(
            "value",
            value.to_string(),
            "Only finite amounts can be formatted",
        ));
    }

    let (prefix, digits) = match currency_info(&normalized) {
        Some(info) => (info.symbol.to_string(), info.fraction_digits),
        None => (format!("{} ", normalized), DEFAULT_FRACTION_DIGITS),
    };

    let magnitude = round_to(value.abs(), digits as i64);
    let sign = if value < 0.0 && magnitude != 0.0 { "-" } else { "" };

    Ok(format!("{}{}{}", sign, prefix, group_amount(magnitude, digits)))
}

/// Render a non-negative amount with thousands separators.
fn group_amount(magnitude: f64, digits: usize) -> String {
    let fixed = format!("{:.*}", digits, magnitude);
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{}.{}", grouped, fraction),
        None => grouped,
    }
}
