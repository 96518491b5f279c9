use async_trait::async_trait;
use std::sync::Arc;
use crate::error::SourceError;
use crate::models::{Address, DepositOffer, U256};
use super::abi::IEscrow;
use super::rpc::RpcClient;
use super::DepositReader;

/// P2P escrow contract reads over JSON-RPC
pub struct EscrowContract {
    rpc: Arc<RpcClient>,
    address: Option<Address>,
}

impl EscrowContract {
    pub fn new(rpc: Arc<RpcClient>, address: Option<Address>) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    fn target(&self) -> Result<Address, SourceError> {
        self.address.ok_or(SourceError::NotConfigured("escrow"))
    }

    /// Principal plus accrued vault yield for a deposit
    pub async fn deposit_value(&self, id: u64) -> Result<U256, SourceError> {
        let call = IEscrow::getDepositValueCall { depositId: U256::from(id) };
        Ok(self.rpc.call(&self.target()?, &call).await?._0)
    }

    pub async fn deposit_yield(&self, id: u64) -> Result<U256, SourceError> {
        let call = IEscrow::getDepositYieldCall { depositId: U256::from(id) };
        Ok(self.rpc.call(&self.target()?, &call).await?._0)
    }

    pub async fn account_deposits(&self, account: &Address) -> Result<Vec<u64>, SourceError> {
        let call = IEscrow::getAccountDepositsCall { account: *account };
        let ids = self.rpc.call(&self.target()?, &call).await?._0;
        ids.into_iter().map(deposit_id).collect()
    }
}

/// Deposit IDs are sequential counters; anything past 64 bits is a broken contract
fn deposit_id(value: U256) -> Result<u64, SourceError> {
    u64::try_from(value).map_err(|_| SourceError::Decode(format!("deposit id {} exceeds u64", value)))
}

fn into_offer(id: u64, ret: IEscrow::depositsReturn) -> DepositOffer {
    DepositOffer {
        id,
        depositor: ret.depositor,
        amount: ret.amount,
        shares_in_vault: ret.sharesInVault,
        payee_details: ret.payeeDetails,
        payment_method: ret.paymentMethod,
        accepting_intents: ret.acceptingIntents,
    }
}

#[async_trait]
impl DepositReader for EscrowContract {
    async fn deposit_counter(&self) -> Result<u64, SourceError> {
        let counter = self.rpc.call(&self.target()?, &IEscrow::depositCounterCall {}).await?._0;
        deposit_id(counter)
    }

    async fn deposit(&self, id: u64) -> Result<DepositOffer, SourceError> {
        let call = IEscrow::depositsCall { depositId: U256::from(id) };
        let ret = self.rpc.call(&self.target()?, &call).await?;
        Ok(into_offer(id, ret))
    }
}
