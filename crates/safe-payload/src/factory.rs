//! Local encoding of `createProxyWithNonce(singleton, setup(...), saltNonce)`.
//!
//! Layout of the initializer (`setup`):
//! - owners: `[owner]`, threshold: 1
//! - to / data: no delegate call on setup
//! - fallbackHandler: compatibility handler
//! - paymentToken / payment / paymentReceiver: zero (relay sponsors the gas)
//!
//! The proxy address is CREATE2-predicted when the factory's
//! `proxyCreationCode()` is known.

use alloy::providers::ProviderBuilder;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use safe_types::contracts::{Safe, SafeProxyFactory};
use safe_types::{address, keccak256, Address, Bytes, Result, SafeError, U256};

use crate::{DeploymentPayload, PayloadService};

/// Safe proxy factory on Base.
pub const PROXY_FACTORY: Address = address!("69f4d1788e39c87893c980c06edf4b7f686e2938");
/// GnosisSafeL2 v1.3.0 singleton.
pub const SAFE_SINGLETON: Address = address!("fb1bffc9d739b8d520daf37df666da4c687191ea");
/// CompatibilityFallbackHandler v1.3.0.
pub const FALLBACK_HANDLER: Address = address!("017062a1de2fe6b99be3d9d37841fed19f573804");

/// Contracts used when encoding a deployment.
#[derive(Debug, Clone)]
pub struct SafeDeploymentConfig {
    pub factory: Address,
    pub singleton: Address,
    pub fallback_handler: Address,
    /// The factory's `proxyCreationCode()`. Without it no address is predicted.
    pub proxy_creation_code: Option<Bytes>,
}

impl Default for SafeDeploymentConfig {
    fn default() -> Self {
        Self {
            factory: PROXY_FACTORY,
            singleton: SAFE_SINGLETON,
            fallback_handler: FALLBACK_HANDLER,
            proxy_creation_code: None,
        }
    }
}

impl SafeDeploymentConfig {
    pub fn with_proxy_creation_code(mut self, code: Bytes) -> Self {
        self.proxy_creation_code = Some(code);
        self
    }

    /// Read `proxyCreationCode()` from the factory through a chain RPC.
    pub async fn fetch_proxy_creation_code(self, rpc_url: &str) -> Result<Self> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| SafeError::Other(format!("invalid chain RPC url {rpc_url}: {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url);
        let factory = SafeProxyFactory::new(self.factory, &provider);

        let code = factory
            .proxyCreationCode()
            .call()
            .await
            .map_err(|e| SafeError::Other(format!("failed to read proxy creation code: {e}")))?;
        info!(factory = %self.factory, len = code.len(), "loaded proxy creation code");
        Ok(self.with_proxy_creation_code(code))
    }
}

/// Encodes Safe deployment transactions without contacting any service.
#[derive(Debug, Clone, Default)]
pub struct FactoryPayloadBuilder {
    config: SafeDeploymentConfig,
}

impl FactoryPayloadBuilder {
    pub fn new(config: SafeDeploymentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SafeDeploymentConfig {
        &self.config
    }

    /// ABI-encode `setup` for a single owner with threshold one.
    pub fn encode_initializer(&self, owner: &Address) -> Bytes {
        Safe::setupCall {
            _owners: vec![*owner],
            _threshold: U256::from(1),
            to: Address::ZERO,
            data: Bytes::new(),
            fallbackHandler: self.config.fallback_handler,
            paymentToken: Address::ZERO,
            payment: U256::ZERO,
            paymentReceiver: Address::ZERO,
        }
        .abi_encode()
        .into()
    }

    /// ABI-encode the factory call for `owner` with the given salt nonce.
    pub fn encode_create_proxy(&self, owner: &Address, salt_nonce: u64) -> Bytes {
        SafeProxyFactory::createProxyWithNonceCall {
            _singleton: self.config.singleton,
            initializer: self.encode_initializer(owner),
            saltNonce: U256::from(salt_nonce),
        }
        .abi_encode()
        .into()
    }

    /// Address the factory deploys the proxy at.
    ///
    /// salt = keccak256(keccak256(initializer) ++ saltNonce),
    /// init code = proxyCreationCode ++ uint256(singleton).
    pub fn predict_address(&self, owner: &Address, salt_nonce: u64) -> Option<Address> {
        let creation_code = self.config.proxy_creation_code.as_ref()?;

        let initializer = self.encode_initializer(owner);
        let salt = keccak256(
            [
                keccak256(&initializer).as_slice(),
                &U256::from(salt_nonce).to_be_bytes::<32>(),
            ]
            .concat(),
        );
        let init_code = [creation_code.as_ref(), self.config.singleton.into_word().as_slice()].concat();

        Some(self.config.factory.create2(salt, keccak256(&init_code)))
    }

    /// Build the payload for `owner` with an explicit salt nonce.
    pub fn build(&self, owner: &Address, salt_nonce: u64) -> DeploymentPayload {
        DeploymentPayload {
            target_contract: self.config.factory,
            call_data: self.encode_create_proxy(owner, salt_nonce),
            value: "0".to_string(),
            predicted_address: self.predict_address(owner, salt_nonce).unwrap_or(Address::ZERO),
        }
    }
}

#[async_trait]
impl PayloadService for FactoryPayloadBuilder {
    async fn get_deployment_payload(&self, owner: &Address) -> Result<DeploymentPayload> {
        let salt_nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let payload = self.build(owner, salt_nonce);
        debug!(%owner, salt_nonce, predicted = %payload.predicted_address, "encoded Safe deployment payload");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::bytes;
    use httpmock::prelude::*;
    use serde_json::json;

    fn owner() -> Address {
        address!("1234567890abcdef1234567890abcdef12345678")
    }

    fn word(n: u64) -> [u8; 32] {
        U256::from(n).to_be_bytes::<32>()
    }

    fn creation_code() -> Bytes {
        bytes!("608060405234801561001057600080fd5b50")
    }

    #[test]
    fn test_selectors() {
        assert_eq!(SafeProxyFactory::createProxyWithNonceCall::SELECTOR, [0x16, 0x88, 0xf0, 0xb9]);
        assert_eq!(Safe::setupCall::SELECTOR, [0xb6, 0x3e, 0x80, 0x0d]);
    }

    #[test]
    fn test_initializer_single_owner_threshold_one() {
        let builder = FactoryPayloadBuilder::default();
        let init = builder.encode_initializer(&owner());
        assert_eq!(init.len(), 4 + 11 * 32);

        let at = |i: usize| &init[4 + i * 32..4 + (i + 1) * 32];
        assert_eq!(at(0), &word(256));
        assert_eq!(at(1), &word(1));
        assert_eq!(at(4), builder.config().fallback_handler.into_word().as_slice());
        assert_eq!(at(8), &word(1)); // one owner
        assert_eq!(at(9), owner().into_word().as_slice());
        assert_eq!(at(10), &word(0)); // empty data
    }

    #[test]
    fn test_create_proxy_layout() {
        let builder = FactoryPayloadBuilder::default();
        let data = builder.encode_create_proxy(&owner(), 1_700_000_000_000);
        assert_eq!((data.len() - 4) % 32, 0);

        let at = |i: usize| &data[4 + i * 32..4 + (i + 1) * 32];
        assert_eq!(at(0), builder.config().singleton.into_word().as_slice());
        assert_eq!(at(1), &word(96));
        assert_eq!(at(2), &word(1_700_000_000_000));
        assert_eq!(at(3), &word(4 + 11 * 32));
        assert_eq!(&data[4 + 4 * 32..4 + 4 * 32 + 4], &Safe::setupCall::SELECTOR);
    }

    #[test]
    fn test_payload_targets_factory_with_zero_value() {
        let builder = FactoryPayloadBuilder::default();
        for owner in [
            owner(),
            address!("0000000000000000000000000000000000000001"),
            address!("ffffffffffffffffffffffffffffffffffffffff"),
        ] {
            let payload = builder.build(&owner, 7);
            assert_eq!(payload.target_contract, PROXY_FACTORY);
            assert_eq!(payload.value, "0");
            assert!(payload.call_data.starts_with(&[0x16, 0x88, 0xf0, 0xb9]));
            assert!(payload
                .call_data
                .windows(32)
                .any(|w| w == owner.into_word().as_slice()));
        }
    }

    #[test]
    fn test_salt_nonce_changes_call_data() {
        let builder = FactoryPayloadBuilder::default();
        assert_ne!(builder.build(&owner(), 1).call_data, builder.build(&owner(), 2).call_data);
    }

    #[test]
    fn test_predicted_address_vector() {
        let builder =
            FactoryPayloadBuilder::new(SafeDeploymentConfig::default().with_proxy_creation_code(creation_code()));

        assert_eq!(
            builder.predict_address(&owner(), 7),
            Some(address!("c7e2719742c932418366b938442ef2e80e5d730e"))
        );
        assert_eq!(
            builder.build(&owner(), 7).predicted_address,
            address!("c7e2719742c932418366b938442ef2e80e5d730e")
        );
        assert_ne!(builder.predict_address(&owner(), 8), builder.predict_address(&owner(), 7));
    }

    #[test]
    fn test_no_prediction_without_creation_code() {
        let builder = FactoryPayloadBuilder::default();
        assert_eq!(builder.predict_address(&owner(), 7), None);
        assert!(builder.build(&owner(), 7).predicted_address.is_zero());
    }

    #[tokio::test]
    async fn test_service_impl_predicts_address() {
        let builder =
            FactoryPayloadBuilder::new(SafeDeploymentConfig::default().with_proxy_creation_code(creation_code()));
        let payload = builder.get_deployment_payload(&owner()).await.unwrap();
        assert_eq!(payload.value, "0");
        assert!(!payload.predicted_address.is_zero());
    }

    #[tokio::test]
    async fn test_fetch_proxy_creation_code() {
        let server = MockServer::start_async().await;
        // ABI-encoded `bytes` return value: offset, length, padded data.
        let result = format!(
            "0x{:064x}{:064x}{}",
            32,
            4,
            format!("deadbeef{}", "0".repeat(56))
        );
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).body_contains("eth_call");
                then.status(200).json_body(json!({ "jsonrpc": "2.0", "id": 0, "result": result }));
            })
            .await;

        let config = SafeDeploymentConfig::default()
            .fetch_proxy_creation_code(&server.base_url())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(config.proxy_creation_code, Some(bytes!("deadbeef")));
    }
}
