//! GraphQL transport against a Torii indexer endpoint.

use crate::{
    records::{
        OwnershipRecord,
        TokenMetadata,
        TokenStandard,
        TransferRecord,
        parse_uint,
    },
    subscription::{
        EntityUpdate,
        EntityUpdateSource,
    },
};
use anyhow::{
    Context,
    Result,
    anyhow,
};
use serde::Deserialize;
use serde_json::{
    Value,
    json,
};
use starknet::core::types::Felt;
use tracing::warn;
use world_bindings::models::TokenConfig;

const ERC_BALANCE_QUERY: &str = r#"
query erc_balance($address: String) {
  ercBalance(accountAddress: $address) {
    type
    balance
    tokenMetadata {
      name
      symbol
      tokenId
      decimals
      contractAddress
    }
  }
}"#;

const ERC_TRANSFER_QUERY: &str = r#"
query erc_transfer($address: String, $limit: Int) {
  ercTransfer(accountAddress: $address, limit: $limit) {
    type
    from
    to
    amount
    executedAt
    transactionHash
    tokenMetadata {
      name
      symbol
      tokenId
      decimals
      contractAddress
    }
  }
}"#;

const TOKEN_CONFIG_QUERY: &str = r#"
query token_config($address: String) {
  exampleTokenConfigModels(where: { token_addressEQ: $address }) {
    edges {
      node {
        token_address
        minter_address
        minted_count
      }
    }
  }
}"#;

#[derive(Clone)]
pub struct GraphqlClient {
    endpoint: String,
    http: reqwest::Client,
}

impl GraphqlClient {
    /// Build a client for the given Torii base URL; the `/graphql` path is
    /// appended here.
    pub fn new(torii_url: impl Into<String>) -> Result<Self> {
        let base = torii_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client for torii")?;
        Ok(Self {
            endpoint: format!("{base}/graphql"),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, query: &str, variables: Value) -> Result<Value> {
        let res = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("torii request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read torii response body")?;
        parse_response(status, &text)
    }

    /// All balance rows the indexer holds for `owner`, malformed rows
    /// skipped with a warning.
    pub async fn erc_balances(&self, owner: Felt) -> Result<Vec<OwnershipRecord>> {
        let variables = json!({ "address": format!("{owner:#x}") });
        let body = self.post(ERC_BALANCE_QUERY, variables).await?;
        balance_rows_from_body(&body)
    }

    /// The most recent `limit` transfer rows touching `owner`.
    pub async fn erc_transfers(
        &self,
        owner: Felt,
        limit: u32,
    ) -> Result<Vec<TransferRecord>> {
        let variables = json!({ "address": format!("{owner:#x}"), "limit": limit });
        let body = self.post(ERC_TRANSFER_QUERY, variables).await?;
        transfer_rows_from_body(&body)
    }

    /// The `TokenConfig` model keyed by the token contract address, if the
    /// indexer has seen it.
    pub async fn token_config(&self, token_address: Felt) -> Result<Option<TokenConfig>> {
        let variables = json!({ "address": format!("{token_address:#x}") });
        let body = self.post(TOKEN_CONFIG_QUERY, variables).await?;
        token_config_from_body(&body)
    }
}

impl std::fmt::Display for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.endpoint)
    }
}

/// Polling update source: re-queries the indexer on a fixed cadence and
/// emits the fetched state every tick, whether or not it changed. Character
/// mint configuration is refreshed on alternating ticks.
pub struct GraphqlPoller {
    client: GraphqlClient,
    owner: Felt,
    character_contract: Felt,
    ticker: tokio::time::Interval,
    fetch_config_next: bool,
}

impl GraphqlPoller {
    pub fn new(
        client: GraphqlClient,
        owner: Felt,
        character_contract: Felt,
        poll_interval: std::time::Duration,
    ) -> Self {
        Self {
            client,
            owner,
            character_contract,
            ticker: tokio::time::interval(poll_interval),
            fetch_config_next: false,
        }
    }
}

impl EntityUpdateSource for GraphqlPoller {
    async fn next_update(&mut self) -> Result<EntityUpdate> {
        loop {
            self.ticker.tick().await;
            let fetch_config = self.fetch_config_next;
            self.fetch_config_next = !fetch_config;
            if fetch_config {
                if let Some(config) =
                    self.client.token_config(self.character_contract).await?
                {
                    return Ok(EntityUpdate::TokenConfig(config));
                }
                continue;
            }
            // View-only runs use the zero owner; balances are never
            // fetched for it.
            if self.owner != Felt::ZERO {
                let records = self.client.erc_balances(self.owner).await?;
                return Ok(EntityUpdate::Balances(records));
            }
        }
    }
}

/// Status is checked before the body is parsed, so a non-JSON error page
/// still reports the HTTP failure it came with.
fn parse_response(status: reqwest::StatusCode, text: &str) -> Result<Value> {
    if !status.is_success() {
        return Err(anyhow!("torii responded with {status}: {text}"));
    }
    let body: Value =
        serde_json::from_str(text).context("invalid JSON in torii response")?;
    if let Some(errors) = body.get("errors")
        && !errors.is_null()
    {
        return Err(anyhow!("torii query returned errors: {errors}"));
    }
    Ok(body)
}

fn balance_rows_from_body(body: &Value) -> Result<Vec<OwnershipRecord>> {
    let rows = body
        .pointer("/data/ercBalance")
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    let dtos: Vec<TokenBalanceDto> =
        serde_json::from_value(rows).context("invalid torii balance payload")?;
    Ok(dtos
        .into_iter()
        .filter_map(|dto| match dto.try_into_record() {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(?err, "skipping malformed balance row");
                None
            }
        })
        .collect())
}

fn transfer_rows_from_body(body: &Value) -> Result<Vec<TransferRecord>> {
    let rows = body
        .pointer("/data/ercTransfer")
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    let dtos: Vec<TransferDto> =
        serde_json::from_value(rows).context("invalid torii transfer payload")?;
    Ok(dtos
        .into_iter()
        .filter_map(|dto| match dto.try_into_record() {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(?err, "skipping malformed transfer row");
                None
            }
        })
        .collect())
}

fn token_config_from_body(body: &Value) -> Result<Option<TokenConfig>> {
    let edges = body
        .pointer("/data/exampleTokenConfigModels/edges")
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    let edges: Vec<EdgeDto<TokenConfigDto>> =
        serde_json::from_value(edges).context("invalid torii token config payload")?;
    match edges.into_iter().next() {
        Some(edge) => Ok(Some(edge.node.try_into_model()?)),
        None => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalanceDto {
    #[serde(rename = "type")]
    standard: String,
    balance: String,
    token_metadata: TokenMetadataDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferDto {
    #[serde(rename = "type")]
    standard: String,
    from: String,
    to: String,
    amount: String,
    executed_at: String,
    transaction_hash: String,
    token_metadata: TokenMetadataDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenMetadataDto {
    name: String,
    symbol: String,
    #[serde(default)]
    token_id: Option<String>,
    decimals: String,
    contract_address: String,
}

#[derive(Debug, Deserialize)]
struct EdgeDto<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct TokenConfigDto {
    token_address: String,
    minter_address: String,
    minted_count: String,
}

impl TokenBalanceDto {
    fn try_into_record(self) -> Result<OwnershipRecord> {
        let balance = parse_uint(&self.balance)
            .ok_or_else(|| anyhow!("unparseable balance '{}'", self.balance))?;
        Ok(OwnershipRecord {
            standard: TokenStandard::from_tag(&self.standard),
            balance,
            token_metadata: self.token_metadata.try_into_metadata()?,
        })
    }
}

impl TransferDto {
    fn try_into_record(self) -> Result<TransferRecord> {
        let amount = parse_uint(&self.amount)
            .ok_or_else(|| anyhow!("unparseable amount '{}'", self.amount))?;
        let from = parse_felt(&self.from)?;
        let to = parse_felt(&self.to)?;
        let transaction_hash = parse_felt(&self.transaction_hash)?;
        Ok(TransferRecord {
            standard: TokenStandard::from_tag(&self.standard),
            from,
            to,
            amount,
            executed_at: self.executed_at,
            transaction_hash,
            token_metadata: self.token_metadata.try_into_metadata()?,
        })
    }
}

impl TokenMetadataDto {
    fn try_into_metadata(self) -> Result<TokenMetadata> {
        let decimals = parse_uint(&self.decimals)
            .and_then(|value| u32::try_from(value).ok())
            .ok_or_else(|| anyhow!("unparseable decimals '{}'", self.decimals))?;
        let token_id = match self.token_id.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                parse_uint(raw)
                    .ok_or_else(|| anyhow!("unparseable token id '{raw}'"))?,
            ),
        };
        let contract_address = parse_felt(&self.contract_address)?;
        Ok(TokenMetadata {
            name: self.name,
            symbol: self.symbol,
            decimals,
            token_id,
            contract_address,
        })
    }
}

impl TokenConfigDto {
    fn try_into_model(self) -> Result<TokenConfig> {
        let minted_count = parse_uint(&self.minted_count)
            .and_then(|value| u64::try_from(value).ok())
            .ok_or_else(|| {
                anyhow!("unparseable minted count '{}'", self.minted_count)
            })?;
        Ok(TokenConfig {
            token_address: parse_felt(&self.token_address)?,
            minter_address: parse_felt(&self.minter_address)?,
            minted_count,
        })
    }
}

fn parse_felt(raw: &str) -> Result<Felt> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        Felt::from_hex(raw).map_err(|err| anyhow!("invalid felt '{raw}': {err}"))
    } else {
        Felt::from_dec_str(raw).map_err(|err| anyhow!("invalid felt '{raw}': {err}"))
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    #[test]
    fn balance_rows_from_body__parses_both_standards() {
        // given a response shaped like the indexer's ercBalance output
        let body = json!({
            "data": {
                "ercBalance": [
                    {
                        "type": "ERC20",
                        "balance": "0x5dc",
                        "tokenMetadata": {
                            "name": "Cash",
                            "symbol": "CASH",
                            "tokenId": "",
                            "decimals": "2",
                            "contractAddress": "0xc1"
                        }
                    },
                    {
                        "type": "ERC721",
                        "balance": "1",
                        "tokenMetadata": {
                            "name": "Character",
                            "symbol": "CHAR",
                            "tokenId": "0x7",
                            "decimals": "0",
                            "contractAddress": "0xc2"
                        }
                    }
                ]
            }
        });

        // when
        let records = balance_rows_from_body(&body).unwrap();

        // then
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].standard, Some(TokenStandard::Erc20));
        assert_eq!(records[0].balance, BigUint::from(1500u32));
        assert_eq!(records[0].token_metadata.decimals, 2);
        assert_eq!(records[1].standard, Some(TokenStandard::Erc721));
        assert_eq!(
            records[1].token_metadata.token_id,
            Some(BigUint::from(7u8))
        );
    }

    #[test]
    fn balance_rows_from_body__unknown_standard__keeps_row_with_no_tag() {
        let body = json!({
            "data": {
                "ercBalance": [{
                    "type": "ERC1155",
                    "balance": "10",
                    "tokenMetadata": {
                        "name": "Odd",
                        "symbol": "ODD",
                        "decimals": "0",
                        "contractAddress": "0x9"
                    }
                }]
            }
        });

        let records = balance_rows_from_body(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].standard, None);
    }

    #[test]
    fn balance_rows_from_body__malformed_balance__skips_row() {
        let body = json!({
            "data": {
                "ercBalance": [
                    {
                        "type": "ERC20",
                        "balance": "not-a-number",
                        "tokenMetadata": {
                            "name": "Bad",
                            "symbol": "BAD",
                            "decimals": "0",
                            "contractAddress": "0x9"
                        }
                    },
                    {
                        "type": "ERC20",
                        "balance": "25",
                        "tokenMetadata": {
                            "name": "Good",
                            "symbol": "GOOD",
                            "decimals": "0",
                            "contractAddress": "0xa"
                        }
                    }
                ]
            }
        });

        let records = balance_rows_from_body(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].token_metadata.symbol, "GOOD");
    }

    #[test]
    fn balance_rows_from_body__missing_data__is_empty() {
        let body = json!({ "data": {} });
        assert!(balance_rows_from_body(&body).unwrap().is_empty());
    }

    #[test]
    fn token_config_from_body__reads_first_edge() {
        let body = json!({
            "data": {
                "exampleTokenConfigModels": {
                    "edges": [{
                        "node": {
                            "token_address": "0xc2",
                            "minter_address": "0xa1",
                            "minted_count": "0x4"
                        }
                    }]
                }
            }
        });

        let config = token_config_from_body(&body).unwrap().unwrap();

        assert_eq!(config.token_address, Felt::from_hex("0xc2").unwrap());
        assert_eq!(config.minted_count, 4);
    }

    #[test]
    fn token_config_from_body__no_edges__is_none() {
        let body = json!({
            "data": { "exampleTokenConfigModels": { "edges": [] } }
        });
        assert!(token_config_from_body(&body).unwrap().is_none());
    }

    #[test]
    fn parse_response__non_success_status__reports_status_even_for_html_body() {
        // given an error page that is not JSON
        let result = parse_response(
            reqwest::StatusCode::BAD_GATEWAY,
            "<html>upstream unavailable</html>",
        );

        // then the HTTP status is what surfaces
        let message = result.unwrap_err().to_string();
        assert!(message.contains("502"));
        assert!(message.contains("upstream unavailable"));
    }

    #[test]
    fn parse_response__graphql_errors__are_reported() {
        let result = parse_response(
            reqwest::StatusCode::OK,
            r#"{ "data": null, "errors": [{ "message": "unknown field" }] }"#,
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("unknown field"));
    }

    #[test]
    fn parse_response__clean_body__passes_through() {
        let body =
            parse_response(reqwest::StatusCode::OK, r#"{ "data": { "ercBalance": [] } }"#)
                .unwrap();
        assert!(body.pointer("/data/ercBalance").is_some());
    }

    #[test]
    fn transfer_rows_from_body__parses_transfer_fields() {
        let body = json!({
            "data": {
                "ercTransfer": [{
                    "type": "ERC20",
                    "from": "0xa11ce",
                    "to": "0xb0b",
                    "amount": "250",
                    "executedAt": "2024-11-03T10:00:00Z",
                    "transactionHash": "0xdead",
                    "tokenMetadata": {
                        "name": "Cash",
                        "symbol": "CASH",
                        "decimals": "2",
                        "contractAddress": "0xc1"
                    }
                }]
            }
        });

        let records = transfer_rows_from_body(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, BigUint::from(250u32));
        assert_eq!(records[0].to, Felt::from_hex("0xb0b").unwrap());
        assert_eq!(records[0].executed_at, "2024-11-03T10:00:00Z");
    }
}
