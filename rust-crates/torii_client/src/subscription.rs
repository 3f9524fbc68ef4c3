//! Entity-update stream over the GraphQL transport.
//!
//! Torii's push subscriptions are not exposed here; instead a background
//! worker polls the indexer and forwards an update only when the fetched
//! state differs from the last one delivered, which gives consumers the
//! same "updates arrive when entities change" shape.

use crate::{
    graphql::GraphqlClient,
    records::OwnershipRecord,
};
use anyhow::{
    Result,
    anyhow,
};
use starknet::core::types::Felt;
use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time,
};
use tracing::warn;
use world_bindings::models::TokenConfig;

/// A change notification for one of the entities the client watches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityUpdate {
    /// The owner's full ownership-record set was refreshed.
    Balances(Vec<OwnershipRecord>),
    /// The character contract's mint configuration changed.
    TokenConfig(TokenConfig),
}

pub trait EntityUpdateSource {
    fn next_update(&mut self) -> impl Future<Output = Result<EntityUpdate>>;
}

/// Subscription-style update source: a spawned worker polls the indexer and
/// only forwards state that differs from what was last sent.
pub struct ToriiSubscription {
    updates: mpsc::Receiver<EntityUpdate>,
    worker: JoinHandle<()>,
}

impl ToriiSubscription {
    pub fn spawn(
        client: GraphqlClient,
        owner: Felt,
        character_contract: Felt,
        poll_interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let worker = tokio::spawn(subscription_loop(
            client,
            owner,
            character_contract,
            poll_interval,
            tx,
        ));
        Self {
            updates: rx,
            worker,
        }
    }
}

impl Drop for ToriiSubscription {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

impl EntityUpdateSource for ToriiSubscription {
    async fn next_update(&mut self) -> Result<EntityUpdate> {
        self.updates
            .recv()
            .await
            .ok_or_else(|| anyhow!("subscription worker stopped"))
    }
}

async fn subscription_loop(
    client: GraphqlClient,
    owner: Felt,
    character_contract: Felt,
    poll_interval: Duration,
    tx: mpsc::Sender<EntityUpdate>,
) {
    let mut ticker = time::interval(poll_interval);
    let mut last_balances: Option<Vec<OwnershipRecord>> = None;
    let mut last_config: Option<TokenConfig> = None;

    loop {
        ticker.tick().await;

        // View-only runs use the zero owner; balances are never fetched
        // for it.
        if owner != Felt::ZERO {
            match client.erc_balances(owner).await {
                Ok(records) => {
                    if changed(&mut last_balances, &records)
                        && tx.send(EntityUpdate::Balances(records)).await.is_err()
                    {
                        return;
                    }
                }
                Err(err) => warn!(?err, "balance poll failed"),
            }
        }

        match client.token_config(character_contract).await {
            Ok(Some(config)) => {
                if changed(&mut last_config, &config)
                    && tx.send(EntityUpdate::TokenConfig(config)).await.is_err()
                {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => warn!(?err, "token config poll failed"),
        }
    }
}

/// Record `current` as the last-seen value, reporting whether it differs
/// from the previous one.
fn changed<T: Clone + PartialEq>(last: &mut Option<T>, current: &T) -> bool {
    if last.as_ref() == Some(current) {
        return false;
    }
    *last = Some(current.clone());
    true
}
