//! Monetary amount normalization for locale-formatted numerals.

use std::sync::OnceLock;

use regex::Regex;

use crate::{errors::Error, Result};

/// Amount as it reaches the writer: user text, or an already numeric value.
#[derive(Clone, Debug, PartialEq)]
pub enum AmountInput {
    Text(String),
    Number(f64),
}

impl From<&str> for AmountInput {
    fn from(s: &str) -> Self {
        AmountInput::Text(s.to_string())
    }
}

impl From<f64> for AmountInput {
    fn from(v: f64) -> Self {
        AmountInput::Number(v)
    }
}

fn non_numeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d,.\-]").expect("static regex"))
}

/// Normalize an amount to a real number.
///
/// `1.234,56` reads as 1234.56 (period groups thousands when a comma is
/// present); a lone comma is the decimal separator; a lone period stays decimal.
pub fn normalize_amount(input: &AmountInput) -> Result<f64> {
    let text = match input {
        AmountInput::Number(v) => return Ok(*v),
        AmountInput::Text(t) => t,
    };

    let mut t = non_numeric().replace_all(text, "").into_owned();
    if t.contains(',') && t.contains('.') {
        t = t.replace('.', "").replace(',', ".");
    } else if t.contains(',') {
        t = t.replace(',', ".");
    }

    t.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::AmountFormat {
            input: text.clone(),
        })
}

/// `1234.5` -> `R$ 1234,50`.
pub fn format_brl(value: f64) -> String {
    format!("R$ {value:.2}").replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<f64> {
        normalize_amount(&AmountInput::from(s))
    }

    #[test]
    fn comma_is_decimal_separator() {
        assert_eq!(parse("300,00").unwrap(), 300.0);
        assert_eq!(parse("12,50").unwrap(), 12.5);
    }

    #[test]
    fn period_groups_thousands_when_comma_present() {
        assert_eq!(parse("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse("R$ 1.000.000,01").unwrap(), 1_000_000.01);
    }

    #[test]
    fn lone_period_is_decimal() {
        assert_eq!(parse("50.5").unwrap(), 50.5);
    }

    #[test]
    fn strips_currency_and_spaces() {
        assert_eq!(parse(" R$ 42 ").unwrap(), 42.0);
        assert_eq!(parse("-10,5").unwrap(), -10.5);
    }

    #[test]
    fn unparseable_amounts_fail() {
        assert!(matches!(parse("abc"), Err(Error::AmountFormat { .. })));
        assert!(matches!(parse(""), Err(Error::AmountFormat { .. })));
        assert!(matches!(parse("1.2.3"), Err(Error::AmountFormat { .. })));
    }

    #[test]
    fn numeric_input_is_used_directly() {
        assert_eq!(normalize_amount(&AmountInput::from(19.9)).unwrap(), 19.9);
    }

    #[test]
    fn formats_with_comma_and_two_decimals() {
        assert_eq!(format_brl(1234.5), "R$ 1234,50");
        assert_eq!(format_brl(12.5), "R$ 12,50");
        assert_eq!(format_brl(300.0), "R$ 300,00");
    }
}
