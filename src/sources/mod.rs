pub mod abi;
pub mod escrow;
pub mod llama;
pub mod rpc;
pub mod token;

use async_trait::async_trait;
use crate::error::SourceError;
use crate::models::{DepositOffer, PoolRecord};

/// External yield-pool data set
#[async_trait]
pub trait YieldSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_pools(&self) -> Result<Vec<PoolRecord>, SourceError>;
}

/// Read side of the escrow contract
#[async_trait]
pub trait DepositReader: Send + Sync {
    async fn deposit_counter(&self) -> Result<u64, SourceError>;

    /// The raw record for `id`. Unused slots come back as a zero-depositor
    /// placeholder, not as an error.
    async fn deposit(&self, id: u64) -> Result<DepositOffer, SourceError>;
}
