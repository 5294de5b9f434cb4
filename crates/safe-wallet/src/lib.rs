//! Connected-wallet capabilities and chain lookups.
//!
//! Defines the `WalletProvider` trait the deployment flow signs through and the
//! `ReceiptSource` trait used to read the deployed Safe address back from chain.

use async_trait::async_trait;
use safe_typed_data::TypedData;
use safe_types::{Address, Hex, Result};

pub mod json_rpc_wallet;
pub mod receipts;

pub use json_rpc_wallet::JsonRpcWallet;
pub use receipts::RpcReceiptSource;

/// A wallet the user has connected. All calls may prompt the user.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet to switch to `chain_id`.
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// The chain the wallet is currently connected to.
    async fn chain_id(&self) -> Result<u64>;

    /// The account that will own the Safe.
    async fn address(&self) -> Result<Address>;

    /// Sign EIP-712 typed data, returning a 0x-prefixed 65-byte signature.
    async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Hex>;
}

/// Looks up the Safe created by a deployment transaction.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// `Ok(None)` when the receipt is unavailable or holds no proxy creation log.
    async fn deployed_safe(&self, transaction_hash: &str) -> Result<Option<Address>>;
}
