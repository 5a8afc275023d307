//! Fixed-precision display formatting.
//!
//! Quote fields are strings with a fixed number of fraction digits. Source
//! values are read the way a lenient float parser reads them (leading
//! whitespace skipped, the longest numeric prefix taken, exponents allowed)
//! and rounded half away from zero on their decimal value. Anything that
//! does not yield a finite number formats as zero.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction digits of `price` and `currencyPrice`.
pub const PRICE_PRECISION: u32 = 2;

/// Fraction digits of `percChange`.
pub const PERCENT_PRECISION: u32 = 2;

/// Fraction digits of `volume`.
pub const VOLUME_PRECISION: u32 = 6;

/// Format a raw numeric field with `precision` fraction digits.
///
/// `None`, empty and non-numeric inputs format as zero.
#[must_use]
pub fn format_fixed(raw: Option<&str>, precision: u32) -> String {
    let Some(literal) = raw.and_then(leading_number) else {
        return zero_fixed(precision);
    };

    if let Some(value) = parse_decimal(&literal) {
        let mut rounded =
            value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(precision);
        // Near the top of the range rescale keeps fewer fraction digits.
        if rounded.scale() == precision {
            return rounded.to_string();
        }
    }

    // Out of decimal range, fall back to binary floating point.
    match literal.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{value:.prec$}", prec = precision as usize),
        _ => zero_fixed(precision),
    }
}

/// Zero with `precision` fraction digits (`0.00`, `0.000000`).
#[must_use]
pub fn zero_fixed(precision: u32) -> String {
    format!("{:.prec$}", 0.0_f64, prec = precision as usize)
}

fn parse_decimal(literal: &str) -> Option<Decimal> {
    if literal.contains('e') {
        Decimal::from_scientific(literal).ok()
    } else {
        Decimal::from_str(literal).ok()
    }
}

/// Extract the longest numeric prefix of `raw` in a canonical form
/// (`[-]digits[.digits][e[-]digits]`).
fn leading_number(raw: &str) -> Option<String> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut literal = String::with_capacity(text.len());
    let mut pos = 0;

    match bytes.first() {
        Some(b'-') => {
            literal.push('-');
            pos += 1;
        }
        Some(b'+') => pos += 1,
        _ => {}
    }

    let int_end = digits_end(bytes, pos);
    let int_digits = &text[pos..int_end];
    pos = int_end;

    let mut frac_digits = "";
    if bytes.get(pos) == Some(&b'.') {
        let frac_end = digits_end(bytes, pos + 1);
        frac_digits = &text[pos + 1..frac_end];
        pos = frac_end;
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    literal.push_str(if int_digits.is_empty() { "0" } else { int_digits });
    if !frac_digits.is_empty() {
        literal.push('.');
        literal.push_str(frac_digits);
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp_pos = pos + 1;
        let negative = bytes.get(exp_pos) == Some(&b'-');
        if matches!(bytes.get(exp_pos), Some(b'-' | b'+')) {
            exp_pos += 1;
        }
        let exp_end = digits_end(bytes, exp_pos);
        if exp_end > exp_pos {
            literal.push('e');
            if negative {
                literal.push('-');
            }
            literal.push_str(&text[exp_pos..exp_end]);
        }
    }

    Some(literal)
}

fn digits_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_fixed(Some("100.005"), PRICE_PRECISION), "100.01");
        assert_eq!(format_fixed(Some("100.004"), PRICE_PRECISION), "100.00");
        assert_eq!(format_fixed(Some("-1.005"), PERCENT_PRECISION), "-1.01");
    }

    #[test]
    fn pads_to_precision() {
        assert_eq!(format_fixed(Some("1.2"), PERCENT_PRECISION), "1.20");
        assert_eq!(format_fixed(Some("42"), VOLUME_PRECISION), "42.000000");
        assert_eq!(format_fixed(Some("3.456789"), VOLUME_PRECISION), "3.456789");
    }

    #[test]
    fn truncates_long_fractions() {
        assert_eq!(
            format_fixed(Some("27123.45670000"), PRICE_PRECISION),
            "27123.46"
        );
        assert_eq!(
            format_fixed(Some("0.00000049"), VOLUME_PRECISION),
            "0.000000"
        );
    }

    #[test]
    fn missing_or_garbage_is_zero() {
        assert_eq!(format_fixed(None, PRICE_PRECISION), "0.00");
        assert_eq!(format_fixed(Some(""), PRICE_PRECISION), "0.00");
        assert_eq!(format_fixed(Some("abc"), VOLUME_PRECISION), "0.000000");
        assert_eq!(format_fixed(Some("."), PRICE_PRECISION), "0.00");
        assert_eq!(format_fixed(Some("Infinity"), PRICE_PRECISION), "0.00");
    }

    #[test]
    fn takes_leading_numeric_prefix() {
        assert_eq!(format_fixed(Some("  12.5abc"), PRICE_PRECISION), "12.50");
        assert_eq!(format_fixed(Some(".5"), PRICE_PRECISION), "0.50");
        assert_eq!(format_fixed(Some("+7"), PRICE_PRECISION), "7.00");
        assert_eq!(format_fixed(Some("3e"), PRICE_PRECISION), "3.00");
    }

    #[test]
    fn accepts_exponents() {
        assert_eq!(format_fixed(Some("1.5e3"), PRICE_PRECISION), "1500.00");
        assert_eq!(format_fixed(Some("2E-2"), PRICE_PRECISION), "0.02");
        assert_eq!(format_fixed(Some("1e+2"), PRICE_PRECISION), "100.00");
    }

    #[test]
    fn falls_back_to_float_outside_decimal_range() {
        let formatted = format_fixed(Some("123456789012345678901234567890123"), PRICE_PRECISION);
        assert!(formatted.ends_with(".00"));
        assert!(formatted.starts_with("1234567890123456"));
    }

    #[test]
    fn zero_matches_precision() {
        assert_eq!(zero_fixed(PRICE_PRECISION), "0.00");
        assert_eq!(zero_fixed(VOLUME_PRECISION), "0.000000");
    }
}
