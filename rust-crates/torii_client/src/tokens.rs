//! Folds the flat ownership-record list returned by the indexer into
//! per-contract token summaries, one collection per token standard.

use crate::records::{
    OwnershipRecord,
    TokenStandard,
};
use num_bigint::BigUint;
use starknet::core::types::Felt;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Erc20Token {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub contract_address: Felt,
    /// Sum of raw record amounts.
    pub balance: BigUint,
    /// `balance / 10^decimals`, integer division. Only meaningful once the
    /// complete record set for the owner has been folded in.
    pub adjusted_balance: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Erc721Token {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub contract_address: Felt,
    /// Number of owned instances.
    pub count: u64,
    /// Owned instance identifiers, in record arrival order. Duplicates are
    /// kept as delivered.
    pub token_ids: Vec<BigUint>,
}

/// Aggregated holdings for one owner, each collection ordered by first
/// occurrence of the contract address in the record list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnedTokens {
    pub erc20: Vec<Erc20Token>,
    pub erc721: Vec<Erc721Token>,
}

/// Rebuild both summary collections from scratch for the given record list.
///
/// The zero owner address short-circuits to empty collections: the indexer
/// is never queried for it upstream, and a stale record list must not be
/// attributed to a disconnected account. Records with an unrecognized
/// standard tag contribute to neither collection.
pub fn tokens_by_owner(owner: Felt, records: &[OwnershipRecord]) -> OwnedTokens {
    let mut tokens = OwnedTokens::default();
    if owner == Felt::ZERO {
        return tokens;
    }

    let mut erc20_index: HashMap<Felt, usize> = HashMap::new();
    let mut erc721_index: HashMap<Felt, usize> = HashMap::new();

    for record in records {
        let meta = &record.token_metadata;
        match record.standard {
            Some(TokenStandard::Erc20) => {
                let index = *erc20_index.entry(meta.contract_address).or_insert_with(|| {
                    tokens.erc20.push(Erc20Token {
                        name: meta.name.clone(),
                        symbol: meta.symbol.clone(),
                        decimals: meta.decimals,
                        contract_address: meta.contract_address,
                        balance: BigUint::ZERO,
                        adjusted_balance: BigUint::ZERO,
                    });
                    tokens.erc20.len() - 1
                });
                let entry = &mut tokens.erc20[index];
                entry.balance += &record.balance;
                entry.adjusted_balance =
                    &entry.balance / BigUint::from(10u32).pow(entry.decimals);
            }
            Some(TokenStandard::Erc721) => {
                let index =
                    *erc721_index.entry(meta.contract_address).or_insert_with(|| {
                        tokens.erc721.push(Erc721Token {
                            name: meta.name.clone(),
                            symbol: meta.symbol.clone(),
                            decimals: meta.decimals,
                            contract_address: meta.contract_address,
                            count: 0,
                            token_ids: Vec::new(),
                        });
                        tokens.erc721.len() - 1
                    });
                let entry = &mut tokens.erc721[index];
                entry.count += 1;
                if let Some(token_id) = &meta.token_id {
                    entry.token_ids.push(token_id.clone());
                }
            }
            None => {}
        }
    }

    tokens
}
