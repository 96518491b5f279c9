//! USDC amount handling. On-chain values are integers in the smallest unit
//! (6 decimals); display values are two-decimal, thousands-separated strings.

use alloy_primitives::U256;
use serde::Serializer;
use crate::error::ValidationError;

pub const USDC_DECIMALS: u32 = 6;
pub const USDC_UNIT: u64 = 1_000_000;

/// `5_000_000` -> `"5.00"`, `1_234_560_000` -> `"1,234.56"`. Rounds half up at the cent.
pub fn format_usdc<T>(amount: T) -> String
where
    U256: alloy_primitives::ruint::UintTryFrom<T>,
{
    let cents = U256::from::<T>(amount).saturating_add(U256::from::<u64>(5_000)) / U256::from::<u64>(10_000);
    let hundred = U256::from::<u64>(100);
    let rem = (cents % hundred).as_limbs()[0];
    format!("{}.{:02}", group_thousands(cents / hundred), rem)
}

/// `serialize_with` helper: uint256 values go out as decimal strings so
/// JSON clients never lose precision.
pub fn decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Exact decimal parse into smallest units. Thousands separators are accepted
/// so that formatted output re-parses; digits past the sixth decimal truncate.
pub fn parse_usdc(input: &str) -> Result<u64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAmount);
    }

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = unsigned.chars().filter(|c| *c != ',').collect();
    let (whole, frac) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(ValidationError::InvalidAmount(trimmed.to_string()));
    }

    let whole_units: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| ValidationError::InvalidAmount(trimmed.to_string()))?
    };

    let mut frac_digits: String = frac.chars().take(USDC_DECIMALS as usize).collect();
    while frac_digits.len() < USDC_DECIMALS as usize {
        frac_digits.push('0');
    }
    let frac_units: u64 = frac_digits
        .parse()
        .map_err(|_| ValidationError::InvalidAmount(trimmed.to_string()))?;

    let total = whole_units
        .checked_mul(USDC_UNIT)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(|| ValidationError::InvalidAmount(trimmed.to_string()))?;

    if negative && total > 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(total)
}

/// `$12.4M`, `$870K`, `$512`
pub fn format_tvl(tvl: f64) -> String {
    if tvl >= 1_000_000.0 {
        format!("${:.1}M", tvl / 1_000_000.0)
    } else if tvl >= 1_000.0 {
        format!("${:.0}K", tvl / 1_000.0)
    } else {
        format!("${:.0}", tvl)
    }
}

fn group_thousands(value: U256) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
