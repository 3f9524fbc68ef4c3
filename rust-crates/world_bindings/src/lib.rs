//! Bindings for the `example` world contracts (`cash`, `character`,
//! `actions`), mirroring the layout emitted by the Dojo bindgen: one
//! `build_*_calldata` / wrapper pair per contract entrypoint.
//!
//! View entrypoints resolve against the world manifest and go through a
//! provider `call`; state-changing entrypoints are executed as an invoke
//! through a connected account.

use anyhow::{
    Result,
    anyhow,
};
use num_bigint::BigUint;
use starknet::{
    accounts::{
        Account,
        ConnectedAccount,
    },
    core::{
        types::{
            BlockId,
            BlockTag,
            Call,
            Felt,
            FunctionCall,
            InvokeTransactionResult,
        },
        utils::get_selector_from_name,
    },
    providers::Provider,
};
use world_manifest::WorldManifest;

pub mod models;

pub const WORLD_NAMESPACE: &str = "example";

/// An unresolved call against a world contract, addressed by contract name
/// rather than deployed address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldCall {
    pub contract: &'static str,
    pub entrypoint: &'static str,
    pub calldata: Vec<Felt>,
}

impl WorldCall {
    /// Resolve the named contract through the manifest into an executable
    /// [`Call`].
    pub fn resolve(&self, manifest: &WorldManifest) -> Result<Call> {
        let contract = manifest.contract_by_name(WORLD_NAMESPACE, self.contract)?;
        let selector = get_selector_from_name(self.entrypoint).map_err(|err| {
            anyhow!("Invalid entrypoint name '{}': {err}", self.entrypoint)
        })?;
        Ok(Call {
            to: contract.address,
            selector,
            calldata: self.calldata.clone(),
        })
    }
}

/// Serialize a `u256` argument as its two-felt (low, high) representation.
/// Values beyond 256 bits violate the contract ABI; excess bytes are dropped.
pub fn u256_calldata(value: &BigUint) -> [Felt; 2] {
    let bytes = value.to_bytes_le();
    let mut low = [0u8; 16];
    let mut high = [0u8; 16];
    for (i, byte) in bytes.iter().take(32).enumerate() {
        if i < 16 {
            low[i] = *byte;
        } else {
            high[i - 16] = *byte;
        }
    }
    [
        Felt::from(u128::from_le_bytes(low)),
        Felt::from(u128::from_le_bytes(high)),
    ]
}

fn bool_calldata(value: bool) -> Felt {
    if value { Felt::ONE } else { Felt::ZERO }
}

async fn call_world<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    call: WorldCall,
) -> Result<Vec<Felt>> {
    let resolved = call.resolve(manifest)?;
    let request = FunctionCall {
        contract_address: resolved.to,
        entry_point_selector: resolved.selector,
        calldata: resolved.calldata,
    };
    provider
        .call(request, BlockId::Tag(BlockTag::Pending))
        .await
        .map_err(|err| {
            anyhow!("{}.{} call failed: {err}", call.contract, call.entrypoint)
        })
}

async fn execute_world<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    call: WorldCall,
) -> Result<InvokeTransactionResult> {
    let resolved = call.resolve(manifest)?;
    account
        .execute_v3(vec![resolved])
        .send()
        .await
        .map_err(|err| {
            anyhow!("{}.{} invoke failed: {err}", call.contract, call.entrypoint)
        })
}

//
// cash
//

pub fn build_cash_allowance_calldata(owner: Felt, spender: Felt) -> WorldCall {
    WorldCall {
        contract: "cash",
        entrypoint: "allowance",
        calldata: vec![owner, spender],
    }
}

pub async fn cash_allowance<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    owner: Felt,
    spender: Felt,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_cash_allowance_calldata(owner, spender)).await
}

pub fn build_cash_approve_calldata(spender: Felt, amount: &BigUint) -> WorldCall {
    let [low, high] = u256_calldata(amount);
    WorldCall {
        contract: "cash",
        entrypoint: "approve",
        calldata: vec![spender, low, high],
    }
}

pub async fn cash_approve<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    spender: Felt,
    amount: &BigUint,
) -> Result<InvokeTransactionResult> {
    execute_world(account, manifest, build_cash_approve_calldata(spender, amount)).await
}

pub fn build_cash_balance_of_calldata(account: Felt) -> WorldCall {
    WorldCall {
        contract: "cash",
        entrypoint: "balanceOf",
        calldata: vec![account],
    }
}

pub async fn cash_balance_of<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    account: Felt,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_cash_balance_of_calldata(account)).await
}

pub fn build_cash_decimals_calldata() -> WorldCall {
    WorldCall {
        contract: "cash",
        entrypoint: "decimals",
        calldata: vec![],
    }
}

pub async fn cash_decimals<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_cash_decimals_calldata()).await
}

pub fn build_cash_faucet_calldata(recipient: Felt) -> WorldCall {
    WorldCall {
        contract: "cash",
        entrypoint: "faucet",
        calldata: vec![recipient],
    }
}

pub async fn cash_faucet<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    recipient: Felt,
) -> Result<InvokeTransactionResult> {
    execute_world(account, manifest, build_cash_faucet_calldata(recipient)).await
}

pub fn build_cash_mint_calldata(recipient: Felt, amount: &BigUint) -> WorldCall {
    let [low, high] = u256_calldata(amount);
    WorldCall {
        contract: "cash",
        entrypoint: "mint",
        calldata: vec![recipient, low, high],
    }
}

pub async fn cash_mint<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    recipient: Felt,
    amount: &BigUint,
) -> Result<InvokeTransactionResult> {
    execute_world(account, manifest, build_cash_mint_calldata(recipient, amount)).await
}

pub fn build_cash_name_calldata() -> WorldCall {
    WorldCall {
        contract: "cash",
        entrypoint: "name",
        calldata: vec![],
    }
}

pub async fn cash_name<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_cash_name_calldata()).await
}

pub fn build_cash_symbol_calldata() -> WorldCall {
    WorldCall {
        contract: "cash",
        entrypoint: "symbol",
        calldata: vec![],
    }
}

pub async fn cash_symbol<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_cash_symbol_calldata()).await
}

pub fn build_cash_total_supply_calldata() -> WorldCall {
    WorldCall {
        contract: "cash",
        entrypoint: "totalSupply",
        calldata: vec![],
    }
}

pub async fn cash_total_supply<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_cash_total_supply_calldata()).await
}

pub fn build_cash_transfer_calldata(recipient: Felt, amount: &BigUint) -> WorldCall {
    let [low, high] = u256_calldata(amount);
    WorldCall {
        contract: "cash",
        entrypoint: "transfer",
        calldata: vec![recipient, low, high],
    }
}

pub async fn cash_transfer<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    recipient: Felt,
    amount: &BigUint,
) -> Result<InvokeTransactionResult> {
    execute_world(account, manifest, build_cash_transfer_calldata(recipient, amount))
        .await
}

pub fn build_cash_transfer_from_calldata(
    sender: Felt,
    recipient: Felt,
    amount: &BigUint,
) -> WorldCall {
    let [low, high] = u256_calldata(amount);
    WorldCall {
        contract: "cash",
        entrypoint: "transferFrom",
        calldata: vec![sender, recipient, low, high],
    }
}

pub async fn cash_transfer_from<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    sender: Felt,
    recipient: Felt,
    amount: &BigUint,
) -> Result<InvokeTransactionResult> {
    execute_world(
        account,
        manifest,
        build_cash_transfer_from_calldata(sender, recipient, amount),
    )
    .await
}

//
// character
//

pub fn build_character_approve_calldata(to: Felt, token_id: &BigUint) -> WorldCall {
    let [low, high] = u256_calldata(token_id);
    WorldCall {
        contract: "character",
        entrypoint: "approve",
        calldata: vec![to, low, high],
    }
}

pub async fn character_approve<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    to: Felt,
    token_id: &BigUint,
) -> Result<InvokeTransactionResult> {
    execute_world(account, manifest, build_character_approve_calldata(to, token_id))
        .await
}

pub fn build_character_balance_of_calldata(account: Felt) -> WorldCall {
    WorldCall {
        contract: "character",
        entrypoint: "balanceOf",
        calldata: vec![account],
    }
}

pub async fn character_balance_of<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    account: Felt,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_character_balance_of_calldata(account)).await
}

pub fn build_character_get_approved_calldata(token_id: &BigUint) -> WorldCall {
    let [low, high] = u256_calldata(token_id);
    WorldCall {
        contract: "character",
        entrypoint: "getApproved",
        calldata: vec![low, high],
    }
}

pub async fn character_get_approved<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    token_id: &BigUint,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_character_get_approved_calldata(token_id))
        .await
}

pub fn build_character_is_approved_for_all_calldata(
    owner: Felt,
    operator: Felt,
) -> WorldCall {
    WorldCall {
        contract: "character",
        entrypoint: "isApprovedForAll",
        calldata: vec![owner, operator],
    }
}

pub async fn character_is_approved_for_all<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    owner: Felt,
    operator: Felt,
) -> Result<Vec<Felt>> {
    call_world(
        provider,
        manifest,
        build_character_is_approved_for_all_calldata(owner, operator),
    )
    .await
}

pub fn build_character_mint_calldata(recipient: Felt) -> WorldCall {
    WorldCall {
        contract: "character",
        entrypoint: "mint",
        calldata: vec![recipient],
    }
}

pub async fn character_mint<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    recipient: Felt,
) -> Result<InvokeTransactionResult> {
    execute_world(account, manifest, build_character_mint_calldata(recipient)).await
}

pub fn build_character_name_calldata() -> WorldCall {
    WorldCall {
        contract: "character",
        entrypoint: "name",
        calldata: vec![],
    }
}

pub async fn character_name<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_character_name_calldata()).await
}

pub fn build_character_owner_of_calldata(token_id: &BigUint) -> WorldCall {
    let [low, high] = u256_calldata(token_id);
    WorldCall {
        contract: "character",
        entrypoint: "ownerOf",
        calldata: vec![low, high],
    }
}

pub async fn character_owner_of<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    token_id: &BigUint,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_character_owner_of_calldata(token_id)).await
}

pub fn build_character_render_uri_calldata(token_id: &BigUint) -> WorldCall {
    let [low, high] = u256_calldata(token_id);
    WorldCall {
        contract: "character",
        entrypoint: "render_uri",
        calldata: vec![low, high],
    }
}

pub async fn character_render_uri<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    token_id: &BigUint,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_character_render_uri_calldata(token_id)).await
}

pub fn build_character_safe_transfer_from_calldata(
    from: Felt,
    to: Felt,
    token_id: &BigUint,
    data: &[Felt],
) -> WorldCall {
    let [low, high] = u256_calldata(token_id);
    let mut calldata = vec![from, to, low, high, Felt::from(data.len() as u64)];
    calldata.extend_from_slice(data);
    WorldCall {
        contract: "character",
        entrypoint: "safeTransferFrom",
        calldata,
    }
}

pub async fn character_safe_transfer_from<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    from: Felt,
    to: Felt,
    token_id: &BigUint,
    data: &[Felt],
) -> Result<InvokeTransactionResult> {
    execute_world(
        account,
        manifest,
        build_character_safe_transfer_from_calldata(from, to, token_id, data),
    )
    .await
}

pub fn build_character_set_approval_for_all_calldata(
    operator: Felt,
    approved: bool,
) -> WorldCall {
    WorldCall {
        contract: "character",
        entrypoint: "setApprovalForAll",
        calldata: vec![operator, bool_calldata(approved)],
    }
}

pub async fn character_set_approval_for_all<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    operator: Felt,
    approved: bool,
) -> Result<InvokeTransactionResult> {
    execute_world(
        account,
        manifest,
        build_character_set_approval_for_all_calldata(operator, approved),
    )
    .await
}

pub fn build_character_supports_interface_calldata(interface_id: Felt) -> WorldCall {
    WorldCall {
        contract: "character",
        entrypoint: "supports_interface",
        calldata: vec![interface_id],
    }
}

pub async fn character_supports_interface<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    interface_id: Felt,
) -> Result<Vec<Felt>> {
    call_world(
        provider,
        manifest,
        build_character_supports_interface_calldata(interface_id),
    )
    .await
}

pub fn build_character_symbol_calldata() -> WorldCall {
    WorldCall {
        contract: "character",
        entrypoint: "symbol",
        calldata: vec![],
    }
}

pub async fn character_symbol<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_character_symbol_calldata()).await
}

pub fn build_character_token_uri_calldata(token_id: &BigUint) -> WorldCall {
    let [low, high] = u256_calldata(token_id);
    WorldCall {
        contract: "character",
        entrypoint: "tokenURI",
        calldata: vec![low, high],
    }
}

pub async fn character_token_uri<P: Provider + Sync>(
    provider: &P,
    manifest: &WorldManifest,
    token_id: &BigUint,
) -> Result<Vec<Felt>> {
    call_world(provider, manifest, build_character_token_uri_calldata(token_id)).await
}

pub fn build_character_transfer_from_calldata(
    from: Felt,
    to: Felt,
    token_id: &BigUint,
) -> WorldCall {
    let [low, high] = u256_calldata(token_id);
    WorldCall {
        contract: "character",
        entrypoint: "transferFrom",
        calldata: vec![from, to, low, high],
    }
}

pub async fn character_transfer_from<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
    from: Felt,
    to: Felt,
    token_id: &BigUint,
) -> Result<InvokeTransactionResult> {
    execute_world(
        account,
        manifest,
        build_character_transfer_from_calldata(from, to, token_id),
    )
    .await
}

//
// actions
//

pub fn build_actions_cash_faucet_calldata() -> WorldCall {
    WorldCall {
        contract: "actions",
        entrypoint: "cash_faucet",
        calldata: vec![],
    }
}

pub async fn actions_cash_faucet<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
) -> Result<InvokeTransactionResult> {
    execute_world(account, manifest, build_actions_cash_faucet_calldata()).await
}

pub fn build_actions_mint_character_calldata() -> WorldCall {
    WorldCall {
        contract: "actions",
        entrypoint: "mint_character",
        calldata: vec![],
    }
}

pub async fn actions_mint_character<A: ConnectedAccount + Sync>(
    account: &A,
    manifest: &WorldManifest,
) -> Result<InvokeTransactionResult> {
    execute_world(account, manifest, build_actions_mint_character_calldata()).await
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use starknet::macros::selector;
    use world_manifest::WorldManifest;

    fn fixture_manifest() -> WorldManifest {
        WorldManifest::from_json(
            r#"{
                "world": { "address": "0x1" },
                "contracts": [
                    { "address": "0xa1", "tag": "example-actions", "systems": [] },
                    { "address": "0xc1", "tag": "example-cash", "systems": [] },
                    { "address": "0xc2", "tag": "example-character", "systems": [] }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn build_cash_transfer_calldata__splits_amount_into_low_and_high() {
        // given
        let recipient = Felt::from(7u8);
        let amount = BigUint::from(u128::MAX) + 5u8;

        // when
        let call = build_cash_transfer_calldata(recipient, &amount);

        // then
        assert_eq!(call.contract, "cash");
        assert_eq!(call.entrypoint, "transfer");
        assert_eq!(
            call.calldata,
            vec![recipient, Felt::from(4u8), Felt::from(1u8)]
        );
    }

    #[test]
    fn build_character_safe_transfer_from_calldata__prefixes_data_length() {
        // given
        let token_id = BigUint::from(3u8);
        let data = [Felt::from(9u8), Felt::from(8u8)];

        // when
        let call = build_character_safe_transfer_from_calldata(
            Felt::ONE,
            Felt::TWO,
            &token_id,
            &data,
        );

        // then
        assert_eq!(
            call.calldata,
            vec![
                Felt::ONE,
                Felt::TWO,
                Felt::from(3u8),
                Felt::ZERO,
                Felt::from(2u8),
                Felt::from(9u8),
                Felt::from(8u8),
            ]
        );
    }

    #[test]
    fn resolve__known_contract__addresses_call_by_manifest_entry() {
        // given
        let manifest = fixture_manifest();
        let call = build_actions_mint_character_calldata();

        // when
        let resolved = call.resolve(&manifest).unwrap();

        // then
        assert_eq!(resolved.to, Felt::from_hex("0xa1").unwrap());
        assert_eq!(resolved.selector, selector!("mint_character"));
        assert!(resolved.calldata.is_empty());
    }

    #[test]
    fn resolve__contract_missing_from_manifest__errors() {
        // given
        let manifest = WorldManifest::from_json(
            r#"{ "world": { "address": "0x1" }, "contracts": [] }"#,
        )
        .unwrap();

        // when
        let result = build_cash_name_calldata().resolve(&manifest);

        // then
        assert!(result.is_err());
    }

    #[test]
    fn u256_calldata__zero__is_two_zero_felts() {
        assert_eq!(u256_calldata(&BigUint::ZERO), [Felt::ZERO, Felt::ZERO]);
    }
}
