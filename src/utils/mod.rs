//! Formatting utilities for CLI display
//!
//! Centralized currency/number formatting so tables and summaries render
//! consistently.

use rust_decimal::Decimal;

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "$" prefix
    Usd,
    /// No currency symbol (for table cells)
    None,
}

/// Format a Decimal with thousands separators and two decimal places.
///
/// # Examples
/// ```
/// use comps::utils::{format_currency, CurrencySymbol};
/// use rust_decimal::Decimal;
///
/// let value = Decimal::new(123456, 2); // 1234.56
/// assert_eq!(format_currency(value, CurrencySymbol::Usd), "$1,234.56");
/// assert_eq!(format_currency(value, CurrencySymbol::None), "1,234.56");
/// ```
pub fn format_currency(value: Decimal, symbol: CurrencySymbol) -> String {
    let is_negative = value < Decimal::ZERO;
    let abs_value = value.abs();

    let formatted = format!("{:.2}", abs_value);
    let parts: Vec<&str> = formatted.split('.').collect();
    let integer_part = parts[0];
    let decimal_part = parts.get(1).unwrap_or(&"00");

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<char>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    match symbol {
        CurrencySymbol::Usd => format!("{}${}.{}", sign, with_separators, decimal_part),
        CurrencySymbol::None => format!("{}{}.{}", sign, with_separators, decimal_part),
    }
}

/// Whole-dollar rendering for summary lines ("$265,000").
pub fn format_whole_dollars(value: Decimal) -> String {
    let rounded = value.round_dp(0);
    let formatted = format_currency(rounded, CurrencySymbol::Usd);
    formatted.trim_end_matches("00").trim_end_matches('.').to_string()
}
