//! Chain check, payload request, typed-data signing and relay submission.
//!
//! Every step runs once and in order; the first failure aborts the attempt.

use std::sync::Arc;
use tracing::{debug, info, warn};

use safe_payload::{DeploymentPayload, PayloadService};
use safe_relay::{RelayRequest, RelayService, SignedRelayRequest, TaskHandle};
use safe_typed_data::{Eip712Domain, TypedData};
use safe_types::{Address, ErrorKind, Hex, Result, SafeError};
use safe_wallet::WalletProvider;

/// Intermediate results reported while submitting.
#[derive(Debug, Clone)]
pub enum SubmissionStep {
    PayloadReceived { owner: Address, payload: DeploymentPayload },
    RequestPrepared(RelayRequest),
    Signed(Hex),
}

/// Keep `err` if it already has `kind`, otherwise wrap its message with `wrap`.
fn classify(err: SafeError, kind: ErrorKind, wrap: impl FnOnce(String) -> SafeError) -> SafeError {
    if err.kind() == kind {
        err
    } else {
        wrap(err.to_string())
    }
}

pub struct RelaySubmitter {
    wallet: Option<Arc<dyn WalletProvider>>,
    payload: Arc<dyn PayloadService>,
    relay: Arc<dyn RelayService>,
    chain_id: u64,
}

impl RelaySubmitter {
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        payload: Arc<dyn PayloadService>,
        relay: Arc<dyn RelayService>,
        chain_id: u64,
    ) -> Self {
        Self { wallet, payload, relay, chain_id }
    }

    /// Make sure `wallet` is on the target chain, switching if it is not.
    pub async fn ensure_chain(&self, wallet: &dyn WalletProvider) -> Result<u64> {
        let target = self.chain_id;

        match wallet.chain_id().await {
            Ok(current) if current == target => return Ok(current),
            Ok(current) => debug!(current, target, "wallet on another chain, switching"),
            Err(e) => debug!(error = %e, "could not read wallet chain, switching"),
        }

        wallet.switch_chain(target).await.map_err(|e| {
            classify(e, ErrorKind::NetworkSwitchFailed, |reason| {
                SafeError::NetworkSwitchFailed { chain_id: target, reason }
            })
        })?;

        let actual = wallet.chain_id().await.map_err(|e| SafeError::NetworkSwitchFailed {
            chain_id: target,
            reason: format!("failed to verify current chain: {e}"),
        })?;

        if actual != target {
            warn!(expected = target, actual, "wrong chain after switch");
            return Err(SafeError::ChainMismatch { expected: target, actual });
        }

        info!(chain_id = actual, "wallet confirmed on target chain");
        Ok(actual)
    }

    /// Run the submission steps, reporting each intermediate result to `on_step`.
    pub async fn submit<F>(&self, mut on_step: F) -> Result<TaskHandle>
    where
        F: FnMut(SubmissionStep) + Send,
    {
        let wallet = self.wallet.as_deref().ok_or(SafeError::WalletMissing)?;

        let chain_id = self.ensure_chain(wallet).await?;

        let owner = wallet.address().await.map_err(|e| match e {
            SafeError::WalletMissing => e,
            other => SafeError::Other(format!("failed to read wallet address: {other}")),
        })?;
        debug!(%owner, "Safe owner");

        let payload = self
            .payload
            .get_deployment_payload(&owner)
            .await
            .map_err(|e| classify(e, ErrorKind::PayloadRequestFailed, SafeError::PayloadRequestFailed))?;
        info!(predicted = %payload.predicted_address, "deployment payload received");
        on_step(SubmissionStep::PayloadReceived { owner, payload: payload.clone() });

        let request = RelayRequest::from_payload(&payload, chain_id);
        let typed = TypedData::forward_request(
            Eip712Domain::relay(chain_id),
            request.to_forward_request(),
        );
        on_step(SubmissionStep::RequestPrepared(request.clone()));

        debug!("requesting user signature");
        let signature = wallet
            .sign_typed_data(&typed)
            .await
            .map_err(|e| classify(e, ErrorKind::SignatureRejected, SafeError::SignatureRejected))?;
        debug!(signature = %signature.get(..10).unwrap_or(&signature), "signature received");
        on_step(SubmissionStep::Signed(signature.clone()));

        let handle = self
            .relay
            .relay_sponsored_transaction(SignedRelayRequest { request, signature })
            .await
            .map_err(|e| classify(e, ErrorKind::RelaySubmissionFailed, SafeError::RelaySubmissionFailed))?;
        info!(task_id = %handle.task_id, "relay request sent");

        Ok(handle)
    }
}
