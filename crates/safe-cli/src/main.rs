mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use cli::{ApiArgs, Cli, Command, DeployArgs};
use safe_deploy::{Collaborators, Deployer, DeploymentEvent};
use safe_history::SafeHistoryClient;
use safe_payload::{FactoryPayloadBuilder, PayloadClient, PayloadService, SafeDeploymentConfig};
use safe_relay::{RelayClient, TaskHandle, TaskStatusService};
use safe_store::{CachedProfileStore, ProfileClient, ProfileStore};
use safe_types::parse_address;
use safe_wallet::{JsonRpcWallet, ReceiptSource, RpcReceiptSource};

type CliResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

async fn payload_service(api: &ApiArgs, local: bool, chain_rpc_url: Option<&str>) -> Arc<dyn PayloadService> {
    if !local {
        return Arc::new(PayloadClient::new(&api.api_url, api.timeout_ms));
    }

    let mut config = SafeDeploymentConfig::default();
    match chain_rpc_url {
        Some(url) => match config.clone().fetch_proxy_creation_code(url).await {
            Ok(loaded) => config = loaded,
            Err(e) => warn!(error = %e, "Safe address will not be predicted"),
        },
        None => warn!("no chain RPC given; Safe address will not be predicted"),
    }
    Arc::new(FactoryPayloadBuilder::new(config))
}

fn print_event(event: DeploymentEvent) {
    match event {
        DeploymentEvent::LoadingChanged { .. } => {}
        DeploymentEvent::PayloadReceived { owner, predicted } => {
            println!("Owner:     {owner}");
            if !predicted.is_zero() {
                println!("Predicted: {predicted}");
            }
        }
        DeploymentEvent::Submitted { task_id } => println!("Relay task {task_id} submitted, waiting..."),
        DeploymentEvent::StatusPolled { task_id, state } => info!(%task_id, ?state, "status"),
        DeploymentEvent::Completed { address } => println!("Safe deployed at {address}"),
        DeploymentEvent::Failed { message, .. } => eprintln!("Error: {message}"),
    }
}

async fn deploy(args: DeployArgs) -> CliResult<()> {
    let mut wallet = JsonRpcWallet::new(&args.wallet_rpc_url)?;
    if let Some(account) = &args.account {
        wallet = wallet.with_account(parse_address(account)?);
    }

    let mut profile = ProfileClient::new(&args.api.api_url, args.api.timeout_ms);
    if let Some(token) = &args.api.api_token {
        profile = profile.with_auth_token(token.clone());
    }
    let profile: Arc<dyn ProfileStore> = Arc::new(CachedProfileStore::new(Arc::new(profile)));

    let factory = SafeDeploymentConfig::default().factory;
    let receipts: Arc<dyn ReceiptSource> = Arc::new(RpcReceiptSource::new(args.chain_rpc())?.with_factory(factory));

    let relay = Arc::new(RelayClient::new(&args.api.api_url, args.api.timeout_ms));
    let services = Collaborators {
        payload: payload_service(&args.api, args.local_payload, Some(args.chain_rpc())).await,
        relay: relay.clone(),
        task_status: relay,
        profile: profile.clone(),
        wallet: Some(Arc::new(wallet)),
        receipts: Some(receipts),
    };

    let deployer = Deployer::new(args.deployer_config(), services, Some(Arc::new(print_event)));
    if deployer.create_safe().await?.is_none() {
        return Ok(());
    }

    let attempt = tokio::select! {
        attempt = deployer.wait_until_settled() => attempt,
        _ = tokio::signal::ctrl_c() => {
            deployer.cancel();
            let attempt = deployer.wait_until_settled().await;
            if let Some(task) = &attempt.task_handle {
                println!("Stopped waiting. Relay task {} keeps running.", task.task_id);
            }
            attempt
        }
    };

    if let Some(err) = attempt.error {
        return Err(err.into());
    }
    if attempt.resolved_address.is_some() {
        let status = profile.onboarding_status().await?;
        info!(
            primary_safe = ?status.primary_safe_address,
            completed = status.has_completed_onboarding,
            "profile updated"
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Deploy(args) => deploy(args).await?,
        Command::Payload {
            owner,
            api,
            local,
            chain_rpc_url,
        } => {
            let owner = parse_address(&owner)?;
            let payload = payload_service(&api, local, chain_rpc_url.as_deref())
                .await
                .get_deployment_payload(&owner)
                .await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Status { task_id, api } => {
            let relay = RelayClient::new(&api.api_url, api.timeout_ms);
            let status = relay.get_task_status(&TaskHandle { task_id }).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::History {
            safe,
            tx_service_url,
            max_pages,
            timeout_ms,
        } => {
            let safe = parse_address(&safe)?;
            let client = SafeHistoryClient::new(&tx_service_url, timeout_ms).with_max_pages(max_pages);
            let items = client.get_history(&safe).await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }

    Ok(())
}
