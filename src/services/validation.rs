use crate::error::ValidationError;
use crate::models::address::parse_address;
use crate::models::usdc::parse_usdc;
use crate::models::{Address, DepositOffer, U256};

fn positive_amount(input: &str) -> Result<u64, ValidationError> {
    let amount = parse_usdc(input)?;
    if amount == 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(amount)
}

/// Amount drawn from the user's own balance (send, vault deposit, escrow deposit)
pub fn validate_amount(input: &str, available: U256) -> Result<u64, ValidationError> {
    let amount = positive_amount(input)?;
    if U256::from(amount) > available {
        return Err(ValidationError::InsufficientBalance { available });
    }
    Ok(amount)
}

/// Amount bought out of an escrow offer
pub fn validate_buy_amount(input: &str, offer: &DepositOffer) -> Result<u64, ValidationError> {
    let amount = positive_amount(input)?;
    if U256::from(amount) > offer.amount {
        return Err(ValidationError::ExceedsOffer { available: offer.amount });
    }
    Ok(amount)
}

/// Well-formed address that is not the sender's own
pub fn validate_recipient(input: &str, sender: Option<&Address>) -> Result<Address, ValidationError> {
    let recipient = parse_address(input)?;
    if sender == Some(&recipient) {
        return Err(ValidationError::SelfSend);
    }
    Ok(recipient)
}
