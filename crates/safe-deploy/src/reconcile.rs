//! Turn a finished polling run into a profile update or an error.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use safe_relay::{TaskHandle, TaskState, TaskStatus};
use safe_store::{ProfileStore, ProfileView};
use safe_types::{Address, SafeError};
use safe_wallet::ReceiptSource;

use crate::poller::PollOutcome;

/// Result of reconciling a polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The Safe was deployed and recorded in the profile.
    Deployed(Address),
    Failed(SafeError),
    /// Polling was cancelled; the relay task keeps running on its own.
    Abandoned,
}

pub struct Reconciler {
    profile: Arc<dyn ProfileStore>,
    receipts: Option<Arc<dyn ReceiptSource>>,
}

impl Reconciler {
    pub fn new(profile: Arc<dyn ProfileStore>, receipts: Option<Arc<dyn ReceiptSource>>) -> Self {
        Self { profile, receipts }
    }

    /// Address of the deployed Safe.
    ///
    /// The proxy address from the transaction receipt wins; the predicted address
    /// is used when there is no receipt to read. The zero address never resolves.
    pub async fn resolve_address(&self, status: &TaskStatus, predicted: Address) -> Option<Address> {
        if let (Some(receipts), Some(tx_hash)) = (&self.receipts, &status.transaction_hash) {
            match receipts.deployed_safe(tx_hash).await {
                Ok(Some(address)) if !address.is_zero() => {
                    if !predicted.is_zero() && predicted != address {
                        warn!(%predicted, actual = %address, "predicted Safe address differs from receipt");
                    }
                    return Some(address);
                }
                Ok(_) => debug!(tx_hash = %tx_hash, "no proxy creation in receipt"),
                Err(e) => warn!(tx_hash = %tx_hash, error = %e, "receipt lookup failed"),
            }
        }

        (!predicted.is_zero()).then_some(predicted)
    }

    pub async fn reconcile(&self, task: &TaskHandle, predicted: Address, outcome: PollOutcome) -> Reconciliation {
        let status = match outcome {
            PollOutcome::Terminal(status) => status,
            PollOutcome::TimedOut { polls } => {
                return Reconciliation::Failed(SafeError::PollingTimedOut {
                    task_id: task.task_id.clone(),
                    polls,
                });
            }
            PollOutcome::Cancelled => return Reconciliation::Abandoned,
        };

        match status.task_state {
            TaskState::ExecSuccess => self.persist(status, predicted).await,
            TaskState::ExecReverted => Reconciliation::Failed(SafeError::TaskExecutionReverted {
                task_id: task.task_id.clone(),
                transaction_hash: status.transaction_hash,
            }),
            TaskState::Cancelled => Reconciliation::Failed(SafeError::TaskCancelled {
                task_id: task.task_id.clone(),
            }),
            other => Reconciliation::Failed(SafeError::Other(format!(
                "task {} ended in non-terminal state {other:?}",
                task.task_id
            ))),
        }
    }

    async fn persist(&self, status: TaskStatus, predicted: Address) -> Reconciliation {
        let transaction_hash = status.transaction_hash.clone();

        let Some(address) = self.resolve_address(&status, predicted).await else {
            error!(tx_hash = ?transaction_hash, "deployed Safe address unknown");
            return Reconciliation::Failed(SafeError::ProfilePersistFailed {
                address: None,
                transaction_hash,
                reason: "deployed Safe address could not be determined".into(),
            });
        };

        if let Err(e) = self.profile.complete_onboarding(&address).await {
            error!(%address, error = %e, "failed to save Safe address");
            return Reconciliation::Failed(SafeError::ProfilePersistFailed {
                address: Some(address),
                transaction_hash,
                reason: e.to_string(),
            });
        }
        info!(%address, "onboarding completed");

        for view in ProfileView::ALL {
            if let Err(e) = self.profile.invalidate(view).await {
                warn!(?view, error = %e, "failed to invalidate profile view");
            }
        }

        Reconciliation::Deployed(address)
    }
}
