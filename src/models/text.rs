//! `bytes32` contract fields holding UTF-8 text right-padded with zero bytes
//! (`payeeDetails`, `paymentMethod`, `fiatCurrency`).

use alloy_primitives::{hex, B256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTooLong {
    pub len: usize,
}

impl fmt::Display for TextTooLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text is {} bytes, the limit is 32", self.len)
    }
}

impl std::error::Error for TextTooLong {}

pub fn encode_text(text: &str) -> Result<B256, TextTooLong> {
    let raw = text.as_bytes();
    if raw.len() > 32 {
        return Err(TextTooLong { len: raw.len() });
    }
    let mut bytes = [0u8; 32];
    bytes[..raw.len()].copy_from_slice(raw);
    Ok(B256::new(bytes))
}

/// Display string for the field. Malformed UTF-8 falls back to a
/// truncated hex preview instead of failing.
pub fn decode_text(value: &B256) -> String {
    let raw = value.as_slice();
    let end = raw.iter().rposition(|b| *b != 0).map(|i| i + 1).unwrap_or(0);
    match std::str::from_utf8(&raw[..end]) {
        Ok(text) => text.to_string(),
        Err(_) => format!("{}...", &hex::encode_prefixed(raw)[..10]),
    }
}
