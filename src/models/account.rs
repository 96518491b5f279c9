use serde::Serialize;
use super::{Address, U256};
use super::usdc::decimal;

/// Wallet, vault and escrow position for one account
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub address: Address,
    #[serde(serialize_with = "decimal")]
    pub usdc_balance: U256,
    pub usdc_balance_display: String,
    #[serde(serialize_with = "decimal")]
    pub vault_shares: U256,
    #[serde(serialize_with = "decimal")]
    pub vault_assets: U256,
    pub vault_assets_display: String,
    #[serde(serialize_with = "decimal")]
    pub vault_allowance: U256,
    #[serde(serialize_with = "decimal")]
    pub escrow_allowance: U256,
    pub deposit_ids: Vec<u64>,
}
