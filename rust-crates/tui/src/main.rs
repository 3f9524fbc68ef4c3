use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod account;
mod client;
mod ui;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: example-client --manifest <path> [--account <address>]\n\
         [--torii-url <url>] [--rpc-url <url>] [--graphql-poll]\n\
         \n\
         Flags:\n\
           --manifest <path>   Path to the world deployment manifest JSON\n\
           --account <address> Account address to act as; omit for view-only mode\n\
           --torii-url <url>   Torii indexer base URL (default {})\n\
           --rpc-url <url>     Starknet RPC URL (default {})\n\
           --graphql-poll      Refetch over GraphQL every tick instead of the\n\
                               change-driven subscription",
        client::DEFAULT_TORII_URL,
        client::DEFAULT_RPC_URL,
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<client::AppConfig> {
    let mut args = std::env::args().skip(1);
    let mut torii_url: Option<String> = None;
    let mut rpc_url: Option<String> = None;
    let mut manifest_path: Option<String> = None;
    let mut account_address = None;
    let mut transport = client::Transport::Subscription;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--torii-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--torii-url requires a URL argument"))?;
                if torii_url.is_some() {
                    return Err(eyre!("--torii-url may only be specified once"));
                }
                torii_url = Some(url);
            }
            "--rpc-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--rpc-url requires a URL argument"))?;
                if rpc_url.is_some() {
                    return Err(eyre!("--rpc-url may only be specified once"));
                }
                rpc_url = Some(url);
            }
            "--manifest" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--manifest requires a path argument"))?;
                if manifest_path.is_some() {
                    return Err(eyre!("--manifest may only be specified once"));
                }
                manifest_path = Some(path);
            }
            "--account" => {
                let raw = args
                    .next()
                    .ok_or_else(|| eyre!("--account requires an address argument"))?;
                if account_address.is_some() {
                    return Err(eyre!("--account may only be specified once"));
                }
                let address = torii_client::parse_owner(&raw).ok_or_else(|| {
                    eyre!("--account must be a non-zero felt address, got '{raw}'")
                })?;
                account_address = Some(address);
            }
            "--graphql-poll" => transport = client::Transport::GraphqlPoll,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let manifest_path = manifest_path
        .ok_or_else(|| eyre!("Specify --manifest <path> to the world manifest"))?;
    let manifest_path = PathBuf::from(shellexpand::tilde(&manifest_path).into_owned());

    Ok(client::AppConfig {
        torii_url: torii_url.unwrap_or_else(|| client::DEFAULT_TORII_URL.to_string()),
        rpc_url: rpc_url.unwrap_or_else(|| client::DEFAULT_RPC_URL.to_string()),
        manifest_path,
        account_address,
        transport,
    })
}

/// Log to a rolling file; stdout belongs to the terminal UI.
fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let appender = tracing_appender::rolling::daily("logs", "example-client.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = init_tracing();
    tracing::info!("starting example world client");
    let app_config = parse_cli_args()?;
    client::run_app(app_config).await
}
