use crate::{
    account::{
        self,
        WorldAccount,
    },
    ui,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use starknet::core::types::Felt;
use std::{
    path::PathBuf,
    time::Duration,
};
use torii_client::{
    EntityUpdate,
    EntityUpdateSource,
    GraphqlClient,
    GraphqlPoller,
    OwnershipRecord,
    ToriiSubscription,
    tokens_by_owner,
};
use tracing::{
    error,
    info,
    warn,
};
use world_bindings::models::TokenConfig;
use world_manifest::WorldManifest;

pub const DEFAULT_TORII_URL: &str = "http://localhost:8080";
pub const DEFAULT_RPC_URL: &str = "http://localhost:5050";

/// How entity updates reach the client: the change-driven subscription
/// stream, or plain polling that refetches on every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Subscription,
    GraphqlPoll,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub torii_url: String,
    pub rpc_url: String,
    pub manifest_path: PathBuf,
    pub account_address: Option<Felt>,
    pub transport: Transport,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub account_address: Option<Felt>,
    pub minted_count: Option<u64>,
    pub tokens: torii_client::OwnedTokens,
    pub can_act: bool,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController {
    manifest: WorldManifest,
    account: Option<WorldAccount>,
    /// Zero when running view-only without an account.
    owner: Felt,
    records: Vec<OwnershipRecord>,
    token_config: Option<TokenConfig>,
    status: String,
    errors: Vec<String>,
}

impl AppController {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let manifest =
            WorldManifest::load(&config.manifest_path).map_err(|err| eyre!(err))?;
        let (account, owner) = match config.account_address {
            Some(address) => {
                let account = account::connect_account(&config.rpc_url, address).await?;
                (Some(account), address)
            }
            None => (None, Felt::ZERO),
        };
        Ok(Self {
            manifest,
            account,
            owner,
            records: Vec::new(),
            token_config: None,
            status: String::from("Ready"),
            errors: Vec::new(),
        })
    }

    pub fn owner(&self) -> Felt {
        self.owner
    }

    pub fn character_contract(&self) -> Result<Felt> {
        self.manifest
            .contract_by_name(world_bindings::WORLD_NAMESPACE, "character")
            .map(|entry| entry.address)
            .map_err(|err| eyre!(err))
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn ingest_update(&mut self, update: EntityUpdate) {
        match update {
            EntityUpdate::Balances(records) => self.records = records,
            EntityUpdate::TokenConfig(config) => self.token_config = Some(config),
        }
    }

    fn build_snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            account_address: (self.owner != Felt::ZERO).then_some(self.owner),
            minted_count: self.token_config.as_ref().map(|c| c.minted_count),
            tokens: tokens_by_owner(self.owner, &self.records),
            can_act: self.account.is_some(),
            status: self.status.clone(),
            errors: self.errors.clone(),
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    async fn mint_character(&mut self) -> Result<Felt> {
        let account = self.account.as_ref().ok_or_else(|| {
            eyre!("No account configured; pass --account to enable actions")
        })?;
        let result = world_bindings::actions_mint_character(account, &self.manifest)
            .await
            .map_err(|err| eyre!(err))?;
        Ok(result.transaction_hash)
    }

    async fn cash_faucet(&mut self) -> Result<Felt> {
        let account = self.account.as_ref().ok_or_else(|| {
            eyre!("No account configured; pass --account to enable actions")
        })?;
        let result = world_bindings::actions_cash_faucet(account, &self.manifest)
            .await
            .map_err(|err| eyre!(err))?;
        Ok(result.transaction_hash)
    }
}

/// The two update sources share a trait that is not object-safe, so the app
/// loop dispatches over this enum instead of a boxed source.
enum Updates {
    Subscription(ToriiSubscription),
    Poll(GraphqlPoller),
}

impl Updates {
    async fn next_update(&mut self) -> anyhow::Result<EntityUpdate> {
        match self {
            Updates::Subscription(source) => source.next_update().await,
            Updates::Poll(source) => source.next_update().await,
        }
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let controller = AppController::new(&config).await?;
    let graphql = GraphqlClient::new(config.torii_url.clone()).map_err(|err| eyre!(err))?;
    let character_contract = controller.character_contract()?;
    let mut updates = match config.transport {
        Transport::Subscription => Updates::Subscription(ToriiSubscription::spawn(
            graphql,
            controller.owner(),
            character_contract,
            controller.poll_interval(),
        )),
        Transport::GraphqlPoll => Updates::Poll(GraphqlPoller::new(
            graphql,
            controller.owner(),
            character_contract,
            controller.poll_interval(),
        )),
    };
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(controller, &mut updates, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop(
    mut controller: AppController,
    updates: &mut Updates,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    info!("Running app loop");
    ui::draw(ui_state, &controller.build_snapshot())
        .wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            update = updates.next_update() => {
                match update {
                    Ok(update) => {
                        controller.ingest_update(update);
                        ui::draw(ui_state, &controller.build_snapshot())
                            .wrap_err("draw after indexer update failed")?;
                    }
                    Err(err) => {
                        warn!(?err, "indexer update failed");
                        controller.push_error(format!("Indexer update failed: {err}"));
                        ui::draw(ui_state, &controller.build_snapshot())
                            .wrap_err("draw after indexer failure failed")?;
                        // The subscription source only errors once its
                        // worker has stopped.
                        if matches!(updates, Updates::Subscription(_)) {
                            break;
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {
                        ui::draw(ui_state, &controller.build_snapshot())
                            .wrap_err("redraw failed")?;
                    }
                    ui::UserEvent::MintCharacter => {
                        controller.set_status("Minting character...");
                        ui::draw(ui_state, &controller.build_snapshot())
                            .wrap_err("draw while minting failed")?;
                        match controller.mint_character().await {
                            Ok(tx_hash) => {
                                controller
                                    .set_status(format!("Mint submitted in {tx_hash:#x}"));
                            }
                            Err(err) => {
                                error!(%err, "mint failed");
                                controller.push_error(format!("Mint failed: {err}"));
                            }
                        }
                        ui::draw(ui_state, &controller.build_snapshot())
                            .wrap_err("draw after mint failed")?;
                    }
                    ui::UserEvent::CashFaucet => {
                        controller.set_status("Requesting cash from faucet...");
                        ui::draw(ui_state, &controller.build_snapshot())
                            .wrap_err("draw while requesting faucet failed")?;
                        match controller.cash_faucet().await {
                            Ok(tx_hash) => {
                                controller.set_status(format!(
                                    "Faucet submitted in {tx_hash:#x}"
                                ));
                            }
                            Err(err) => {
                                error!(%err, "faucet failed");
                                controller.push_error(format!("Faucet failed: {err}"));
                            }
                        }
                        ui::draw(ui_state, &controller.build_snapshot())
                            .wrap_err("draw after faucet failed")?;
                    }
                }
            }
        }
    }
    Ok(())
}
