//! Sponsored relay requests and task tracking.
//!
//! - Derive a relay request from a deployment payload
//! - Submit the signed request to the relay
//! - Query task status by id

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use safe_payload::DeploymentPayload;
use safe_typed_data::ForwardRequest;
use safe_types::{Address, Bytes, Hex, Result};

pub mod relay_client;

pub use relay_client::RelayClient;

/// Relay request for a sponsored call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub chain_id: u64,
    pub target: Address,
    pub data: Bytes,
    pub value: String,
}

impl RelayRequest {
    pub fn from_payload(payload: &DeploymentPayload, chain_id: u64) -> Self {
        Self {
            chain_id,
            target: payload.target_contract,
            data: payload.call_data.clone(),
            value: payload.value.clone(),
        }
    }

    /// The typed-data message the wallet signs for this request.
    pub fn to_forward_request(&self) -> ForwardRequest {
        ForwardRequest {
            chain_id: self.chain_id,
            target: self.target,
            data: self.data.clone(),
            value: self.value.clone(),
        }
    }
}

/// A relay request together with the owner's typed-data signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRelayRequest {
    pub request: RelayRequest,
    pub signature: Hex,
}

/// Relay submission receipt; the key for status polling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    pub task_id: String,
}

/// Relay task lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    CheckPending,
    ExecPending,
    WaitingForConfirmation,
    ExecSuccess,
    ExecReverted,
    Cancelled,
    /// Any state this client does not know; treated as intermediate.
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::ExecSuccess | TaskState::ExecReverted | TaskState::Cancelled
        )
    }
}

/// Task status as reported by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub task_state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<Hex>,
}

/// Submits signed requests to the sponsored relay.
#[async_trait]
pub trait RelayService: Send + Sync {
    async fn relay_sponsored_transaction(&self, signed: SignedRelayRequest) -> Result<TaskHandle>;
}

/// Reports relay task status.
#[async_trait]
pub trait TaskStatusService: Send + Sync {
    async fn get_task_status(&self, task: &TaskHandle) -> Result<TaskStatus>;
}
