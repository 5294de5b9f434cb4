//! Client-side Safe deployment through a sponsored relay.
//!
//! Flow for one attempt:
//! 1. Verify the wallet is on the target chain (switching if needed)
//! 2. Request the deployment payload for the wallet's account
//! 3. Sign the relay request as EIP-712 typed data
//! 4. Submit to the relay, receiving a task id
//! 5. Poll the task until it is terminal, then reconcile into the profile

pub mod attempt;
pub mod deployer;
pub mod poller;
pub mod reconcile;
pub mod submitter;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use safe_relay::TaskState;
use safe_types::{Address, ErrorKind};

pub use attempt::DeploymentAttempt;
pub use deployer::{Collaborators, Deployer};
pub use poller::{PollOutcome, PollingTask, TaskPoller};
pub use reconcile::{Reconciler, Reconciliation};
pub use submitter::{RelaySubmitter, SubmissionStep};

/// Base mainnet.
pub const BASE_CHAIN_ID: u64 = 8453;

/// Deployment flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Chain the Safe is deployed on; the wallet must be switched to it.
    pub target_chain_id: u64,
    /// Delay between task status queries.
    pub poll_interval_ms: u64,
    /// Give up after this many status queries. `None` polls until a terminal state.
    pub max_polls: Option<u32>,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            target_chain_id: BASE_CHAIN_ID,
            poll_interval_ms: 5_000,
            // One hour at the default interval.
            max_polls: Some(720),
        }
    }
}

impl DeployerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Progress events emitted during an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentEvent {
    LoadingChanged { loading: bool },
    PayloadReceived { owner: Address, predicted: Address },
    Submitted { task_id: String },
    StatusPolled { task_id: String, state: TaskState },
    Completed { address: Address },
    Failed { kind: ErrorKind, message: String },
}

/// Callback type for deployment events.
pub type DeploymentEventHandler = Arc<dyn Fn(DeploymentEvent) + Send + Sync>;
