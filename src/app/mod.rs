//! Application services built on the endpoint pool.

pub mod balance;
pub mod transfer;

pub use balance::BalanceQueryService;
pub use transfer::{TransferConfig, TransferOrchestrator};

use solana_sdk::pubkey::Pubkey;

use crate::domain::ValidationError;

/// Parse a base58 account address, failing before any network call.
pub(crate) fn parse_address(address: &str) -> Result<Pubkey, ValidationError> {
    address
        .parse::<Pubkey>()
        .map_err(|e| ValidationError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}
