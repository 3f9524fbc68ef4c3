use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use rpassword::prompt_password;
use starknet::{
    accounts::{
        ExecutionEncoding,
        SingleOwnerAccount,
    },
    core::types::Felt,
    providers::{
        JsonRpcClient,
        Provider,
        jsonrpc::HttpTransport,
    },
    signers::{
        LocalWallet,
        SigningKey,
    },
};
use url::Url;

pub type WorldAccount = SingleOwnerAccount<JsonRpcClient<HttpTransport>, LocalWallet>;

pub fn connect_provider(rpc_url: &str) -> Result<JsonRpcClient<HttpTransport>> {
    let url =
        Url::parse(rpc_url).wrap_err_with(|| format!("Invalid RPC URL '{rpc_url}'"))?;
    Ok(JsonRpcClient::new(HttpTransport::new(url)))
}

/// Resolve the account's signing key: from `STARKNET_PRIVATE_KEY` when set,
/// otherwise by prompting on the terminal before the UI takes over.
pub fn resolve_signing_key(address: Felt) -> Result<SigningKey> {
    let raw = match std::env::var("STARKNET_PRIVATE_KEY") {
        Ok(raw) if !raw.trim().is_empty() => raw,
        _ => prompt_password(format!("Enter private key for account {address:#x}: "))
            .wrap_err("Failed to read private key")?,
    };
    let secret = Felt::from_hex(raw.trim())
        .map_err(|_| eyre!("Private key is not a valid hex-encoded felt"))?;
    if secret == Felt::ZERO {
        return Err(eyre!("Private key must be non-zero"));
    }
    Ok(SigningKey::from_secret_scalar(secret))
}

pub async fn connect_account(rpc_url: &str, address: Felt) -> Result<WorldAccount> {
    let signing_key = resolve_signing_key(address)?;
    let provider = connect_provider(rpc_url)?;
    let chain_id = provider
        .chain_id()
        .await
        .wrap_err_with(|| format!("Failed to query chain id from {rpc_url}"))?;
    Ok(SingleOwnerAccount::new(
        provider,
        LocalWallet::from(signing_key),
        address,
        chain_id,
        ExecutionEncoding::New,
    ))
}
