//! Read the deployed Safe address from the deployment transaction receipt.
//!
//! The proxy factory emits `ProxyCreation(address proxy, address singleton)`.
//! v1.3.0 factories leave `proxy` unindexed (first data word); v1.4.x index it
//! (topics[1]). Both layouts are accepted.

use alloy::primitives::Log;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use tracing::debug;

use safe_types::contracts::{legacy, SafeProxyFactory};
use safe_types::{Address, Result, SafeError, B256};

use crate::ReceiptSource;

fn decode_proxy(log: &Log) -> Option<Address> {
    SafeProxyFactory::ProxyCreation::decode_log(log)
        .map(|event| event.data.proxy)
        .or_else(|_| legacy::ProxyCreation::decode_log(log).map(|event| event.data.proxy))
        .ok()
}

/// Extract the created proxy from receipt logs, optionally only from `factory`'s logs.
pub fn proxy_from_logs<'a>(
    logs: impl IntoIterator<Item = &'a Log>,
    factory: Option<&Address>,
) -> Option<Address> {
    logs.into_iter()
        .filter(|log| factory.map_or(true, |f| log.address == *f))
        .filter(|log| log.topics().first() == Some(&SafeProxyFactory::ProxyCreation::SIGNATURE_HASH))
        .find_map(decode_proxy)
}

/// Receipt lookups over a node's JSON-RPC endpoint.
pub struct RpcReceiptSource {
    provider: DynProvider,
    factory: Option<Address>,
}

impl RpcReceiptSource {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| SafeError::Other(format!("invalid chain RPC url {rpc_url}: {e}")))?;
        Ok(Self {
            provider: ProviderBuilder::new().connect_http(url).erased(),
            factory: None,
        })
    }

    /// Only trust `ProxyCreation` logs emitted by `factory`.
    pub fn with_factory(mut self, factory: Address) -> Self {
        self.factory = Some(factory);
        self
    }
}

#[async_trait]
impl ReceiptSource for RpcReceiptSource {
    async fn deployed_safe(&self, transaction_hash: &str) -> Result<Option<Address>> {
        let hash: B256 = transaction_hash
            .parse()
            .map_err(|_| SafeError::InvalidHex(transaction_hash.to_string()))?;

        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| SafeError::Other(format!("eth_getTransactionReceipt failed: {e}")))?;

        let Some(receipt) = receipt else {
            debug!(transaction_hash, "receipt not available yet");
            return Ok(None);
        };

        if !receipt.status() {
            debug!(transaction_hash, "deployment transaction reverted on chain");
            return Ok(None);
        }

        let logs = receipt.inner.logs().iter().map(|log| &log.inner);
        Ok(proxy_from_logs(logs, self.factory.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, Bytes};
    use httpmock::prelude::*;
    use serde_json::json;

    const FACTORY: Address = address!("69f4d1788e39c87893c980c06edf4b7f686e2938");
    const SAFE: Address = address!("5afe5afe5afe5afe5afe5afe5afe5afe5afe5afe");
    const SINGLETON: Address = address!("fb1bffc9d739b8d520daf37df666da4c687191ea");
    const TX_HASH: &str = "0x00000000000000000000000000000000000000000000000000000000000feed1";

    fn legacy_log(emitter: Address) -> Log {
        let data = [SAFE.into_word().as_slice(), SINGLETON.into_word().as_slice()].concat();
        Log::new_unchecked(
            emitter,
            vec![SafeProxyFactory::ProxyCreation::SIGNATURE_HASH],
            data.into(),
        )
    }

    fn indexed_log(emitter: Address) -> Log {
        Log::new_unchecked(
            emitter,
            vec![SafeProxyFactory::ProxyCreation::SIGNATURE_HASH, SAFE.into_word()],
            Bytes::copy_from_slice(SINGLETON.into_word().as_slice()),
        )
    }

    fn rpc_log(log: &Log, index: u64) -> serde_json::Value {
        json!({
            "address": log.address,
            "topics": log.topics(),
            "data": log.data.data,
            "blockHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x10",
            "transactionHash": TX_HASH,
            "transactionIndex": "0x0",
            "logIndex": format!("{index:#x}"),
            "removed": false
        })
    }

    fn receipt_json(status: &str, logs: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "transactionHash": TX_HASH,
            "transactionIndex": "0x0",
            "blockHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x10",
            "from": "0x1234567890abcdef1234567890abcdef12345678",
            "to": FACTORY,
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "contractAddress": null,
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "status": status,
            "type": "0x2",
            "logs": logs
        })
    }

    async fn receipt_server(result: serde_json::Value) -> MockServer {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .body_contains("eth_getTransactionReceipt")
                    .body_contains(TX_HASH);
                then.status(200).json_body(json!({ "jsonrpc": "2.0", "id": 0, "result": result }));
            })
            .await;
        server
    }

    #[test]
    fn test_event_topic() {
        assert_eq!(
            SafeProxyFactory::ProxyCreation::SIGNATURE_HASH,
            b256!("4f51faf6c4561ff95f067657e43439f0f856d97c04d9ec9070a6199ad418e235")
        );
        assert_eq!(
            legacy::ProxyCreation::SIGNATURE_HASH,
            SafeProxyFactory::ProxyCreation::SIGNATURE_HASH
        );
    }

    #[test]
    fn test_unindexed_proxy_in_data() {
        assert_eq!(proxy_from_logs(&[legacy_log(FACTORY)], Some(&FACTORY)), Some(SAFE));
    }

    #[test]
    fn test_indexed_proxy_in_topics() {
        assert_eq!(proxy_from_logs(&[indexed_log(FACTORY)], None), Some(SAFE));
    }

    #[test]
    fn test_logs_from_other_contracts_are_ignored() {
        let foreign = legacy_log(address!("1111111111111111111111111111111111111111"));
        let other_event = Log::new_unchecked(
            FACTORY,
            vec![b256!("141df868a6331af528e38c83b7aa03edc19be66e37ae67f9285bf4f8e3c6a1a8")],
            Bytes::new(),
        );
        assert_eq!(proxy_from_logs(&[foreign, other_event], Some(&FACTORY)), None);
    }

    #[test]
    fn test_truncated_log_data_is_ignored() {
        let truncated = Log::new_unchecked(
            FACTORY,
            vec![SafeProxyFactory::ProxyCreation::SIGNATURE_HASH],
            Bytes::copy_from_slice(&[0u8; 8]),
        );
        assert_eq!(proxy_from_logs(&[truncated], None), None);
    }

    #[tokio::test]
    async fn test_rpc_lookup() {
        let server = receipt_server(receipt_json("0x1", vec![rpc_log(&legacy_log(FACTORY), 0)])).await;

        let source = RpcReceiptSource::new(&server.base_url()).unwrap().with_factory(FACTORY);
        assert_eq!(source.deployed_safe(TX_HASH).await.unwrap(), Some(SAFE));
    }

    #[tokio::test]
    async fn test_reverted_receipt_has_no_proxy() {
        let server = receipt_server(receipt_json("0x0", vec![rpc_log(&indexed_log(FACTORY), 0)])).await;

        let source = RpcReceiptSource::new(&server.base_url()).unwrap();
        assert_eq!(source.deployed_safe(TX_HASH).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_receipt() {
        let server = receipt_server(serde_json::Value::Null).await;

        let source = RpcReceiptSource::new(&server.base_url()).unwrap();
        assert!(source.deployed_safe(TX_HASH).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        let source = RpcReceiptSource::new("http://127.0.0.1:1").unwrap();
        assert!(source.deployed_safe("0xfeed").await.is_err());
    }
}
