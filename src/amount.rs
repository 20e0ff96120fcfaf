//! Token amount conversion
//!
//! Converts between human-readable decimal amounts ("1.5") and the integer
//! base-unit strings ("1500000000") the aggregator API expects.
//!
//! All scaling is done on decimal digit strings, never through `f64`, so
//! amounts keep full precision up to the token's decimal count. Base-unit
//! strings may exceed `u64` for 18-decimal tokens.

use crate::{Error, Result};

/// Fractional digits shown by [`to_human_units`]
pub const DISPLAY_FRACTION_DIGITS: usize = 6;

/// True when `value` is a non-empty string of ASCII digits that is not zero
pub fn is_positive_integer(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_digit())
        && value.bytes().any(|b| b != b'0')
}

/// Convert a human-readable decimal amount to base units
///
/// Fractional digits beyond `decimals` are accepted only when they are all
/// zeros, so a six-digit display value of a low-decimal token converts back
/// cleanly. Anything that would need rounding is rejected.
///
/// # Errors
/// `InvalidAmount` when the input is not a non-negative decimal numeral or
/// is not greater than zero.
pub fn to_base_units(human: &str, decimals: u8) -> Result<String> {
    let trimmed = human.trim();
    let not_numeral =
        || Error::InvalidAmount(format!("'{}' is not a non-negative decimal number", human));

    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(not_numeral());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(not_numeral());
    }

    let decimals = decimals as usize;
    let fraction = if frac_part.len() > decimals {
        let (kept, excess) = frac_part.split_at(decimals);
        if excess.bytes().any(|b| b != b'0') {
            return Err(Error::InvalidAmount(format!(
                "'{}' has more than {} decimal places",
                human, decimals
            )));
        }
        kept.to_string()
    } else {
        format!("{:0<width$}", frac_part, width = decimals)
    };

    let digits = format!("{}{}", int_part, fraction);
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Err(Error::InvalidAmount(format!(
            "'{}' must be greater than zero",
            human
        )));
    }

    Ok(significant.to_string())
}

/// Split a base-unit string into its integer and full fractional digits
fn split_units(base: &str, decimals: usize) -> Option<(String, String)> {
    if base.is_empty() || !base.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = base.trim_start_matches('0');
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);

    let int_part = match int_part.trim_start_matches('0') {
        "" => "0",
        rest => rest,
    };

    Some((int_part.to_string(), frac_part.to_string()))
}

/// Render base units as `<integer>.<6 fractional digits> <symbol>`
///
/// Display-only: input that is not an integer string is echoed back as-is
/// with the symbol instead of failing.
pub fn to_human_units(base: &str, decimals: u8, symbol: &str) -> String {
    match split_units(base.trim(), decimals as usize) {
        Some((int_part, frac_part)) => {
            let shown: String = format!("{:0<width$}", frac_part, width = DISPLAY_FRACTION_DIGITS)
                .chars()
                .take(DISPLAY_FRACTION_DIGITS)
                .collect();
            format!("{}.{} {}", int_part, shown, symbol)
        }
        None => {
            tracing::debug!(amount = base, "Non-integer base amount, displaying verbatim");
            format!("{} {}", base.trim(), symbol)
        }
    }
}

/// Render base units as an exact decimal with trailing zeros trimmed
///
/// `format_units("20500000", 6) == "20.5"`. Non-integer input is returned
/// unchanged.
pub fn format_units(base: &str, decimals: u8) -> String {
    match split_units(base.trim(), decimals as usize) {
        Some((int_part, frac_part)) => {
            let trimmed = frac_part.trim_end_matches('0');
            if trimmed.is_empty() {
                int_part
            } else {
                format!("{}.{}", int_part, trimmed)
            }
        }
        None => base.trim().to_string(),
    }
}

/// Shorten a mint address to `abcd...wxyz` for display
pub fn short_address(address: &str) -> String {
    if address.len() <= 8 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..4], &address[address.len() - 4..])
}

/// Human display that falls back to a shortened address when the symbol
/// is unknown
pub fn display_amount(base: &str, decimals: u8, symbol: Option<&str>, address: &str) -> String {
    match symbol.filter(|s| !s.trim().is_empty()) {
        Some(symbol) => to_human_units(base, decimals, symbol),
        None => to_human_units(base, decimals, &short_address(address)),
    }
}
