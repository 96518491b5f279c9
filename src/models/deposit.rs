use serde::Serialize;
use super::{Address, B256, U256};
use super::address::short;
use super::text::decode_text;
use super::usdc::{decimal, format_usdc};

/// P2P escrow deposit as read from the escrow contract's `deposits(id)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOffer {
    pub id: u64,
    pub depositor: Address,
    pub amount: U256,
    pub shares_in_vault: U256,
    pub payee_details: B256,
    pub payment_method: B256,
    pub accepting_intents: bool,
}

impl DepositOffer {
    /// Displayable iff the depositor is accepting intents and the slot is not
    /// the zero-address placeholder.
    pub fn is_active(&self) -> bool {
        self.accepting_intents && !self.depositor.is_zero()
    }

    pub fn view(&self) -> OfferView {
        OfferView {
            id: self.id,
            depositor: self.depositor,
            depositor_short: short(&self.depositor),
            amount: self.amount,
            amount_display: format_usdc(self.amount),
            payment_method: decode_text(&self.payment_method),
            payee_details: decode_text(&self.payee_details),
            accepting_intents: self.accepting_intents,
        }
    }
}

/// Decoded, display-ready form of a deposit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferView {
    pub id: u64,
    pub depositor: Address,
    pub depositor_short: String,
    #[serde(serialize_with = "decimal")]
    pub amount: U256,
    pub amount_display: String,
    pub payment_method: String,
    pub payee_details: String,
    pub accepting_intents: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSource {
    Live,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferList {
    pub source: OfferSource,
    pub offers: Vec<OfferView>,
}

/// Deposit record plus its live vault-backed value
#[derive(Debug, Clone, Serialize)]
pub struct DepositDetail {
    pub offer: OfferView,
    #[serde(serialize_with = "decimal")]
    pub current_value: U256,
    pub current_value_display: String,
    #[serde(serialize_with = "decimal")]
    pub yield_earned: U256,
    pub yield_earned_display: String,
}
