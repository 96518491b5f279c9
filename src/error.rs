use thiserror::Error;
use crate::models::usdc::format_usdc;
use crate::models::U256;

/// Failures of external collaborators (yield API, JSON-RPC node)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Rate limited")]
    RateLimit,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{0} address is not configured")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Parse(e.to_string())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}

impl From<alloy_sol_types::Error> for SourceError {
    fn from(e: alloy_sol_types::Error) -> Self {
        SourceError::Decode(e.to_string())
    }
}

/// Local input checks. Display strings are shown inline next to the field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Enter an amount")]
    EmptyAmount,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Insufficient balance ({} USDC)", format_usdc(*.available))]
    InsufficientBalance { available: U256 },

    #[error("Max available: {} USDC", format_usdc(*.available))]
    ExceedsOffer { available: U256 },

    #[error("Invalid wallet address")]
    InvalidAddress,

    #[error("Cannot send to yourself")]
    SelfSend,

    #[error("{field} is longer than 32 bytes")]
    TextTooLong { field: &'static str },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
