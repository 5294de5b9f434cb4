use clap::{Args, Parser, Subcommand};

use safe_deploy::{DeployerConfig, BASE_CHAIN_ID};
use safe_history::history_client::BASE_TRANSACTION_SERVICE_URL;

#[derive(Debug, Parser)]
#[command(name = "safe-deployer", about = "Deploy and inspect Safe accounts through a sponsored relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy a single-owner Safe for the connected wallet and record it in the profile.
    Deploy(DeployArgs),
    /// Print the deployment payload for an owner.
    Payload {
        owner: String,
        #[command(flatten)]
        api: ApiArgs,
        /// Encode the factory call locally instead of asking the backend.
        #[arg(long, default_value_t = false)]
        local: bool,
        /// Chain RPC for the factory's proxy creation code, used with `--local`.
        #[arg(env = "SAFE_CHAIN_RPC_URL", long)]
        chain_rpc_url: Option<String>,
    },
    /// Print the relay status of a task.
    Status {
        task_id: String,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Print the executed transactions of a Safe, including its creation.
    History {
        safe: String,
        #[arg(env = "SAFE_TX_SERVICE_URL", long, default_value = BASE_TRANSACTION_SERVICE_URL)]
        tx_service_url: String,
        #[arg(long, default_value_t = 5)]
        max_pages: usize,
        #[arg(env = "SAFE_HTTP_TIMEOUT_MS", long)]
        timeout_ms: Option<u64>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ApiArgs {
    /// Backend serving the payload, relay and profile endpoints.
    #[arg(env = "SAFE_API_URL", long, default_value = "http://localhost:3000/api")]
    pub api_url: String,

    /// Bearer token for profile calls.
    #[arg(env = "SAFE_API_TOKEN", long)]
    pub api_token: Option<String>,

    #[arg(env = "SAFE_HTTP_TIMEOUT_MS", long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// JSON-RPC endpoint of the wallet that signs the relay request.
    #[arg(env = "SAFE_WALLET_RPC_URL", long, default_value = "http://localhost:8545")]
    pub wallet_rpc_url: String,

    /// Signing account; defaults to the wallet's first account.
    #[arg(env = "SAFE_WALLET_ACCOUNT", long)]
    pub account: Option<String>,

    /// Chain RPC for receipts and the factory's proxy creation code. Defaults to the wallet RPC.
    #[arg(env = "SAFE_CHAIN_RPC_URL", long)]
    pub chain_rpc_url: Option<String>,

    #[arg(env = "SAFE_CHAIN_ID", long, default_value_t = BASE_CHAIN_ID)]
    pub chain_id: u64,

    #[arg(env = "SAFE_POLL_INTERVAL_MS", long, default_value_t = 5_000)]
    pub poll_interval_ms: u64,

    /// Status queries before giving up. 0 polls until the task is terminal.
    #[arg(env = "SAFE_MAX_POLLS", long, default_value_t = 720)]
    pub max_polls: u32,

    /// Encode the factory call locally instead of asking the backend.
    #[arg(long, default_value_t = false)]
    pub local_payload: bool,
}

impl DeployArgs {
    pub fn chain_rpc(&self) -> &str {
        self.chain_rpc_url.as_deref().unwrap_or(&self.wallet_rpc_url)
    }

    pub fn deployer_config(&self) -> DeployerConfig {
        DeployerConfig {
            target_chain_id: self.chain_id,
            poll_interval_ms: self.poll_interval_ms,
            max_polls: (self.max_polls > 0).then_some(self.max_polls),
        }
    }
}
