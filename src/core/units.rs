//! Unit conversion
//!
//! Lossless conversion between integer base-unit amounts and decimal display
//! strings. All arithmetic is done on decimal digit strings over `U256`, so
//! conversions stay exact for 256-bit token amounts; floating point is never
//! involved.

use crate::core::errors::WalletError;
use ethers::types::U256;

/// Formats a base-unit amount as a display string.
///
/// The integer part is grouped in thousands and trailing fractional zeros
/// are trimmed, matching the explorer-facing display format.
pub fn to_display(amount: U256, decimals: u32) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;

    let (int_part, frac_part) = if digits.len() <= decimals {
        let mut frac = String::with_capacity(decimals);
        frac.extend(std::iter::repeat('0').take(decimals - digits.len()));
        frac.push_str(&digits);
        ("0".to_string(), frac)
    } else {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    };

    let grouped = group_thousands(&int_part);
    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac)
    }
}

/// Parses a display string back into base units.
///
/// Grouping separators are accepted and ignored. Fails with `InvalidAmount`
/// if the input is not a plain decimal literal, carries more fractional
/// digits than `decimals` allows (no silent truncation), or does not fit in
/// 256 bits.
pub fn to_base_units(display: &str, decimals: u32) -> Result<U256, WalletError> {
    let cleaned = display.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err(WalletError::InvalidAmount("empty amount".to_string()));
    }

    let (int_part, frac_part) = match cleaned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (cleaned.as_str(), ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(WalletError::InvalidAmount(format!(
            "not a decimal literal: {}",
            display
        )));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(WalletError::InvalidAmount(format!(
            "not a decimal literal: {}",
            display
        )));
    }
    if frac_part.len() > decimals as usize {
        return Err(WalletError::InvalidAmount(format!(
            "{} fractional digits exceed the unit precision of {}",
            frac_part.len(),
            decimals
        )));
    }

    let mut digits = String::with_capacity(int_part.len() + decimals as usize);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    digits.extend(std::iter::repeat('0').take(decimals as usize - frac_part.len()));
    if digits.is_empty() {
        digits.push('0');
    }

    U256::from_dec_str(&digits)
        .map_err(|_| WalletError::InvalidAmount("value does not fit in 256 bits".to_string()))
}

/// Parses a display amount that must fit the chain's 64-bit output value.
pub fn to_base_units_u64(display: &str, decimals: u32) -> Result<u64, WalletError> {
    let value = to_base_units(display, decimals)?;
    if value > U256::from(u64::MAX) {
        return Err(WalletError::InvalidAmount(
            "value exceeds the 64-bit output range".to_string(),
        ));
    }
    Ok(value.as_u64())
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
