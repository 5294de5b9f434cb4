//! Safe deployment payloads.
//!
//! - `FactoryPayloadBuilder`: encodes the proxy-factory call locally
//! - `PayloadClient`: asks the backend for the payload over HTTP
//!
//! Every payload deploys a single-owner Safe with threshold one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use safe_types::{Address, Bytes, Result};

pub mod factory;
pub mod payload_client;

pub use factory::{FactoryPayloadBuilder, SafeDeploymentConfig};
pub use payload_client::PayloadClient;

/// Unsigned transaction that deploys a new Safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPayload {
    /// Proxy factory the transaction calls.
    #[serde(rename = "to")]
    pub target_contract: Address,
    #[serde(rename = "data")]
    pub call_data: Bytes,
    /// Decimal wei amount, always "0" for deployments.
    pub value: String,
    /// Predicted Safe address. The zero address when the producer cannot predict it.
    #[serde(rename = "predicted")]
    pub predicted_address: Address,
}

/// Producer of deployment payloads for a given owner.
#[async_trait]
pub trait PayloadService: Send + Sync {
    async fn get_deployment_payload(&self, owner: &Address) -> Result<DeploymentPayload>;
}
