pub mod account;
pub mod address;
pub mod deposit;
pub mod pool;
pub mod recipient;
pub mod text;
pub mod usdc;

pub use account::AccountSummary;
pub use alloy_primitives::{Address, B256, U256};
pub use deposit::{DepositDetail, DepositOffer, OfferList, OfferSource, OfferView};
pub use pool::{BestYield, MarketsView, PoolRecord};
pub use recipient::Recipient;
