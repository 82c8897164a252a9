//! Conversion from human-readable decimal amounts to indivisible base units.

use num_bigint::BigUint;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("amount `{0}` is not a decimal number")]
    Malformed(String),

    #[error("amount `{0}` has more fractional digits than the asset's {1} decimals")]
    TooPrecise(String, u32),
}

/// Convert a decimal amount string (e.g. `"0.05"`) into base units
/// (`amount * 10^decimals`) using exact integer arithmetic.
///
/// Floating point never touches the value, so an amount like `0.05` with 18
/// decimals is exactly `5 * 10^16`.
pub fn to_base_units(amount: &str, decimals: u32) -> Result<BigUint, UnitError> {
    let amount = amount.trim();
    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    let malformed = || UnitError::Malformed(amount.to_string());
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(malformed());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }
    if frac_part.len() > decimals as usize {
        return Err(UnitError::TooPrecise(amount.to_string(), decimals));
    }

    let mut digits = String::with_capacity(int_part.len() + frac_part.len());
    digits.push_str(int_part);
    digits.push_str(frac_part);
    let mantissa = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(malformed)?;

    let scale = decimals as usize - frac_part.len();
    Ok(mantissa * BigUint::from(10u32).pow(scale as u32))
}
