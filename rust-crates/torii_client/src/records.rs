use num_bigint::BigUint;
use starknet::core::types::Felt;

/// Token standard tag carried by every indexer ownership row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStandard {
    Erc20,
    Erc721,
}

impl TokenStandard {
    /// Parse the indexer's tag. Unrecognized tags map to `None` and are
    /// ignored by aggregation rather than treated as errors.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ERC20" => Some(TokenStandard::Erc20),
            "ERC721" => Some(TokenStandard::Erc721),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    /// Instance identifier; present on non-fungible rows only.
    pub token_id: Option<BigUint>,
    pub contract_address: Felt,
}

/// One row of the indexer's `ercBalance` query output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub standard: Option<TokenStandard>,
    pub balance: BigUint,
    pub token_metadata: TokenMetadata,
}

/// One row of the indexer's `ercTransfer` query output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    pub standard: Option<TokenStandard>,
    pub from: Felt,
    pub to: Felt,
    pub amount: BigUint,
    pub executed_at: String,
    pub transaction_hash: Felt,
    pub token_metadata: TokenMetadata,
}

/// Parse an unsigned numeric string as emitted by Torii: `0x`-prefixed hex
/// or plain decimal.
pub fn parse_uint(raw: &str) -> Option<BigUint> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        BigUint::parse_bytes(hex.as_bytes(), 16)
    } else {
        BigUint::parse_bytes(raw.as_bytes(), 10)
    }
}

/// Parse an owner address, requiring a valid positive value. Non-numeric
/// input and the zero address both yield `None`, which callers treat as
/// "skip the fetch" rather than an error.
pub fn parse_owner(raw: &str) -> Option<Felt> {
    let raw = raw.trim();
    let owner = if raw.starts_with("0x") || raw.starts_with("0X") {
        Felt::from_hex(raw).ok()?
    } else {
        Felt::from_dec_str(raw).ok()?
    };
    (owner != Felt::ZERO).then_some(owner)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn parse_uint__accepts_hex_and_decimal() {
        assert_eq!(parse_uint("0x5dc"), Some(BigUint::from(1500u32)));
        assert_eq!(parse_uint("1500"), Some(BigUint::from(1500u32)));
        assert_eq!(parse_uint("not a number"), None);
    }

    #[test]
    fn parse_owner__zero_or_garbage__is_none() {
        assert_eq!(parse_owner("0x0"), None);
        assert_eq!(parse_owner("0"), None);
        assert_eq!(parse_owner("bob"), None);
        assert_eq!(parse_owner(""), None);
    }

    #[test]
    fn parse_owner__positive_address__round_trips() {
        let owner = parse_owner("0x517ececd29116499f4a1b64b094da79ba08dfd54a3edaa316134c41f8160973")
            .unwrap();
        assert_ne!(owner, Felt::ZERO);
    }

    #[test]
    fn from_tag__recognizes_both_standards_only() {
        assert_eq!(TokenStandard::from_tag("ERC20"), Some(TokenStandard::Erc20));
        assert_eq!(TokenStandard::from_tag("ERC721"), Some(TokenStandard::Erc721));
        assert_eq!(TokenStandard::from_tag("ERC1155"), None);
        assert_eq!(TokenStandard::from_tag(""), None);
    }
}
