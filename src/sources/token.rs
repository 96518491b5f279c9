use std::sync::Arc;
use crate::error::SourceError;
use crate::models::{Address, U256};
use super::abi::{IUsdc, IVault};
use super::rpc::RpcClient;

/// USDC token and ERC-4626 savings vault reads
pub struct TokenContracts {
    rpc: Arc<RpcClient>,
    usdc: Option<Address>,
    vault: Option<Address>,
}

impl TokenContracts {
    pub fn new(rpc: Arc<RpcClient>, usdc: Option<Address>, vault: Option<Address>) -> Self {
        Self { rpc, usdc, vault }
    }

    pub fn vault_address(&self) -> Option<Address> {
        self.vault
    }

    fn usdc(&self) -> Result<Address, SourceError> {
        self.usdc.ok_or(SourceError::NotConfigured("usdc"))
    }

    fn vault(&self) -> Result<Address, SourceError> {
        self.vault.ok_or(SourceError::NotConfigured("vault"))
    }

    pub async fn usdc_balance(&self, account: &Address) -> Result<U256, SourceError> {
        let call = IUsdc::balanceOfCall { account: *account };
        Ok(self.rpc.call(&self.usdc()?, &call).await?._0)
    }

    pub async fn usdc_allowance(&self, owner: &Address, spender: &Address) -> Result<U256, SourceError> {
        let call = IUsdc::allowanceCall { owner: *owner, spender: *spender };
        Ok(self.rpc.call(&self.usdc()?, &call).await?._0)
    }

    /// Vault share balance (eUSDC)
    pub async fn vault_shares(&self, account: &Address) -> Result<U256, SourceError> {
        let call = IVault::balanceOfCall { account: *account };
        Ok(self.rpc.call(&self.vault()?, &call).await?._0)
    }

    pub async fn convert_to_assets(&self, shares: U256) -> Result<U256, SourceError> {
        let call = IVault::convertToAssetsCall { shares };
        Ok(self.rpc.call(&self.vault()?, &call).await?._0)
    }

    pub async fn total_assets(&self) -> Result<U256, SourceError> {
        Ok(self.rpc.call(&self.vault()?, &IVault::totalAssetsCall {}).await?._0)
    }
}
