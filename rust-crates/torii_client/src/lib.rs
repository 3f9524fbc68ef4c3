//! Client for a Torii indexer serving the `example` world: a GraphQL
//! transport, an entity-update subscription stream, and the aggregation of
//! raw ownership records into per-contract token summaries.

pub mod graphql;
pub mod records;
pub mod subscription;
pub mod tokens;

pub use graphql::{
    GraphqlClient,
    GraphqlPoller,
};
pub use records::{
    OwnershipRecord,
    TokenMetadata,
    TokenStandard,
    TransferRecord,
    parse_owner,
    parse_uint,
};
pub use subscription::{
    EntityUpdate,
    EntityUpdateSource,
    ToriiSubscription,
};
pub use tokens::{
    Erc20Token,
    Erc721Token,
    OwnedTokens,
    tokens_by_owner,
};
