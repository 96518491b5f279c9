//! Contract interfaces for the USDC token, the ERC-4626 savings vault and
//! the P2P escrow, plus the write calls an external wallet signs.

use alloy_sol_types::{sol, SolCall};
use serde::Deserialize;
use crate::error::ValidationError;
use crate::models::address::checked;
use crate::models::text::encode_text;
use crate::models::{Address, B256, U256};

sol! {
    interface IUsdc {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
    }

    interface IVault {
        function balanceOf(address account) external view returns (uint256);
        function convertToAssets(uint256 shares) external view returns (uint256);
        function totalAssets() external view returns (uint256);
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function withdraw(uint256 assets, address receiver, address owner) external returns (uint256 shares);
        function redeem(uint256 shares, address receiver, address owner) external returns (uint256 assets);
    }

    interface IEscrow {
        function deposits(uint256 depositId) external view returns (
            address depositor,
            uint256 amount,
            uint256 sharesInVault,
            bytes32 payeeDetails,
            bytes32 paymentMethod,
            bool acceptingIntents
        );
        function depositCounter() external view returns (uint256);
        function getDepositValue(uint256 depositId) external view returns (uint256);
        function getDepositYield(uint256 depositId) external view returns (uint256);
        function getAccountDeposits(address account) external view returns (uint256[]);
        function createDeposit(uint256 amount, bytes32 payeeDetails, bytes32 paymentMethod) external returns (uint256 depositId);
        function addFunds(uint256 depositId, uint256 amount) external;
        function signalIntent(uint256 depositId, uint256 amount, address to, uint256 fiatAmount, bytes32 fiatCurrency) external returns (bytes32 intentHash);
        function cancelIntent(bytes32 intentHash) external;
        function setAcceptingIntents(uint256 depositId, bool accepting) external;
        function withdrawDeposit(uint256 depositId) external;
    }
}

/// Which configured contract a write call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Usdc,
    Vault,
    Escrow,
}

/// State-changing calls an external wallet signs and submits.
/// Amounts are in the smallest USDC unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "function", rename_all = "camelCase")]
pub enum WriteCall {
    Approve {
        #[serde(deserialize_with = "checked")]
        spender: Address,
        amount: u64,
    },
    Transfer {
        #[serde(deserialize_with = "checked")]
        to: Address,
        amount: u64,
    },
    /// Test-network faucet
    Mint {
        #[serde(deserialize_with = "checked")]
        to: Address,
        amount: u64,
    },
    Deposit {
        assets: u64,
        #[serde(deserialize_with = "checked")]
        receiver: Address,
    },
    Withdraw {
        assets: u64,
        #[serde(deserialize_with = "checked")]
        receiver: Address,
        #[serde(deserialize_with = "checked")]
        owner: Address,
    },
    Redeem {
        shares: u64,
        #[serde(deserialize_with = "checked")]
        receiver: Address,
        #[serde(deserialize_with = "checked")]
        owner: Address,
    },
    CreateDeposit { amount: u64, payee_details: String, payment_method: String },
    AddFunds { deposit_id: u64, amount: u64 },
    SignalIntent {
        deposit_id: u64,
        amount: u64,
        #[serde(deserialize_with = "checked")]
        to: Address,
        fiat_amount: u64,
        #[serde(default = "default_fiat_currency")]
        fiat_currency: String,
    },
    CancelIntent { intent_hash: B256 },
    SetAcceptingIntents { deposit_id: u64, accepting: bool },
    WithdrawDeposit { deposit_id: u64 },
}

fn default_fiat_currency() -> String {
    "USD".to_string()
}

fn padded(text: &str, field: &'static str) -> Result<B256, ValidationError> {
    encode_text(text).map_err(|_| ValidationError::TextTooLong { field })
}

impl WriteCall {
    pub fn target(&self) -> ContractKind {
        match self {
            WriteCall::Approve { .. } | WriteCall::Transfer { .. } | WriteCall::Mint { .. } => {
                ContractKind::Usdc
            }
            WriteCall::Deposit { .. } | WriteCall::Withdraw { .. } | WriteCall::Redeem { .. } => {
                ContractKind::Vault
            }
            _ => ContractKind::Escrow,
        }
    }

    pub fn calldata(&self) -> Result<Vec<u8>, ValidationError> {
        let data = match self {
            WriteCall::Approve { spender, amount } => IUsdc::approveCall {
                spender: *spender,
                amount: U256::from(*amount),
            }
            .abi_encode(),
            WriteCall::Transfer { to, amount } => IUsdc::transferCall {
                to: *to,
                amount: U256::from(*amount),
            }
            .abi_encode(),
            WriteCall::Mint { to, amount } => IUsdc::mintCall {
                to: *to,
                amount: U256::from(*amount),
            }
            .abi_encode(),
            WriteCall::Deposit { assets, receiver } => IVault::depositCall {
                assets: U256::from(*assets),
                receiver: *receiver,
            }
            .abi_encode(),
            WriteCall::Withdraw { assets, receiver, owner } => IVault::withdrawCall {
                assets: U256::from(*assets),
                receiver: *receiver,
                owner: *owner,
            }
            .abi_encode(),
            WriteCall::Redeem { shares, receiver, owner } => IVault::redeemCall {
                shares: U256::from(*shares),
                receiver: *receiver,
                owner: *owner,
            }
            .abi_encode(),
            WriteCall::CreateDeposit { amount, payee_details, payment_method } => {
                let payee = if payee_details.trim().is_empty() {
                    "contact-seller"
                } else {
                    payee_details.as_str()
                };
                IEscrow::createDepositCall {
                    amount: U256::from(*amount),
                    payeeDetails: padded(payee, "payee_details")?,
                    paymentMethod: padded(payment_method, "payment_method")?,
                }
                .abi_encode()
            }
            WriteCall::AddFunds { deposit_id, amount } => IEscrow::addFundsCall {
                depositId: U256::from(*deposit_id),
                amount: U256::from(*amount),
            }
            .abi_encode(),
            WriteCall::SignalIntent { deposit_id, amount, to, fiat_amount, fiat_currency } => {
                IEscrow::signalIntentCall {
                    depositId: U256::from(*deposit_id),
                    amount: U256::from(*amount),
                    to: *to,
                    fiatAmount: U256::from(*fiat_amount),
                    fiatCurrency: padded(fiat_currency, "fiat_currency")?,
                }
                .abi_encode()
            }
            WriteCall::CancelIntent { intent_hash } => IEscrow::cancelIntentCall {
                intentHash: *intent_hash,
            }
            .abi_encode(),
            WriteCall::SetAcceptingIntents { deposit_id, accepting } => {
                IEscrow::setAcceptingIntentsCall {
                    depositId: U256::from(*deposit_id),
                    accepting: *accepting,
                }
                .abi_encode()
            }
            WriteCall::WithdrawDeposit { deposit_id } => IEscrow::withdrawDepositCall {
                depositId: U256::from(*deposit_id),
            }
            .abi_encode(),
        };
        Ok(data)
    }
}
