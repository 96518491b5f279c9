use alloy_primitives::Address;
use serde::{Deserialize, Deserializer};
use crate::error::ValidationError;

/// Wallet input: `0x` + 40 hex digits. All-lowercase and all-uppercase
/// digits carry no checksum; mixed case must be valid EIP-55.
pub fn parse_address(input: &str) -> Result<Address, ValidationError> {
    let trimmed = input.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or(ValidationError::InvalidAddress)?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress);
    }

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(format!("0x{}", hex_part), None)
            .map_err(|_| ValidationError::InvalidAddress)
    } else {
        hex_part.parse::<Address>().map_err(|_| ValidationError::InvalidAddress)
    }
}

/// `deserialize_with` helper applying the same checksum rule as `parse_address`
pub fn checked<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_address(&s).map_err(serde::de::Error::custom)
}

/// `deserialize_with` helper for optional addresses
pub fn checked_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Address>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|s| parse_address(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// `0x7a2F...b890` style preview of the checksummed form
pub fn short(address: &Address) -> String {
    short_address(&address.to_checksum(None))
}

/// First 6 and last 4 characters of an address-like string
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
