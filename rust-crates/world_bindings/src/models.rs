//! Model types for the `example` world, matching the Dojo model schema.

use starknet::core::types::Felt;

/// `example::models::token_config::TokenConfig`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenConfig {
    pub token_address: Felt,
    pub minter_address: Felt,
    pub minted_count: u64,
}

/// `example::models::coin_config::CoinConfig`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinConfig {
    pub coin_address: Felt,
    pub minter_address: Felt,
    pub faucet_amount: u64,
}
