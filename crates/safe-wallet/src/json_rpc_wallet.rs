//! Wallet reached through an EIP-1193 style JSON-RPC endpoint.
//!
//! Methods used:
//! - wallet_switchEthereumChain
//! - eth_chainId
//! - eth_accounts
//! - eth_signTypedData_v4

use alloy::primitives::Signature;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::TransportError;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use safe_typed_data::TypedData;
use safe_types::{Address, Bytes, Hex, Result, SafeError};

use crate::WalletProvider;

/// EIP-1193 code for a request the user rejected.
pub const USER_REJECTED_REQUEST: i64 = 4001;

fn rpc_reason(e: &TransportError) -> String {
    match e.as_error_resp() {
        Some(payload) => format!("code {}: {}", payload.code, payload.message),
        None => e.to_string(),
    }
}

pub struct JsonRpcWallet {
    provider: DynProvider,
    account: Option<Address>,
}

impl JsonRpcWallet {
    pub fn new(url: &str) -> Result<Self> {
        let url: reqwest::Url = url
            .parse()
            .map_err(|e| SafeError::Other(format!("invalid wallet RPC url {url}: {e}")))?;
        Ok(Self {
            provider: ProviderBuilder::new().connect_http(url).erased(),
            account: None,
        })
    }

    /// Use a fixed account instead of the first one reported by `eth_accounts`.
    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        let params = (json!({ "chainId": format!("{chain_id:#x}") }),);
        self.provider
            .raw_request::<_, serde_json::Value>("wallet_switchEthereumChain".into(), params)
            .await
            .map_err(|e| SafeError::NetworkSwitchFailed {
                chain_id,
                reason: rpc_reason(&e),
            })?;
        info!(chain_id, "wallet switched chain");
        Ok(())
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| SafeError::Other(format!("eth_chainId failed: {}", rpc_reason(&e))))
    }

    async fn address(&self) -> Result<Address> {
        if let Some(account) = self.account {
            return Ok(account);
        }
        let accounts = self
            .provider
            .get_accounts()
            .await
            .map_err(|e| SafeError::Other(format!("eth_accounts failed: {}", rpc_reason(&e))))?;
        accounts.first().copied().ok_or(SafeError::WalletMissing)
    }

    async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Hex> {
        let signer = self.address().await?;
        let digest = typed_data.signing_hash()?;
        debug!(%signer, %digest, "requesting typed-data signature");

        let signature: Bytes = self
            .provider
            .raw_request("eth_signTypedData_v4".into(), (signer, typed_data.to_json()))
            .await
            .map_err(|e| match e.as_error_resp() {
                Some(payload) if payload.code == USER_REJECTED_REQUEST => {
                    SafeError::SignatureRejected("transaction rejected in wallet".into())
                }
                _ => SafeError::SignatureRejected(rpc_reason(&e)),
            })?;

        if signature.len() != 65 {
            return Err(SafeError::SignatureRejected(format!(
                "wallet returned a {}-byte signature",
                signature.len()
            )));
        }

        let recovered = Signature::from_raw(&signature)
            .and_then(|s| s.recover_address_from_prehash(&digest))
            .map_err(|e| SafeError::SignatureRejected(format!("unreadable signature: {e}")))?;
        if recovered != signer {
            return Err(SafeError::SignatureRejected(format!(
                "signature is from {recovered}, expected {signer}"
            )));
        }

        Ok(signature.to_string())
    }
}
