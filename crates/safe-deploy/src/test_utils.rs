//! In-memory collaborators for deployment tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use safe_payload::{DeploymentPayload, FactoryPayloadBuilder, PayloadService, SafeDeploymentConfig};
use safe_relay::{RelayService, SignedRelayRequest, TaskHandle, TaskState, TaskStatus, TaskStatusService};
use safe_store::{OnboardingStatus, ProfileStore};
use safe_typed_data::TypedData;
use safe_types::{address, parse_bytes, Address, Hex, Result, SafeError};
use safe_wallet::{ReceiptSource, WalletProvider};

pub const TX_HASH: &str = "0xfeedfeedfeedfeedfeedfeedfeedfeedfeedfeedfeedfeedfeedfeedfeedfeed";

pub fn owner() -> Address {
    address!("1111111111111111111111111111111111111111")
}

/// Builder with a known proxy creation code, so deployments get a CREATE2 prediction.
pub fn payload_builder() -> FactoryPayloadBuilder {
    let code = parse_bytes("0x608060405234801561001057600080fd5b50").unwrap();
    FactoryPayloadBuilder::new(SafeDeploymentConfig::default().with_proxy_creation_code(code))
}

/// Address `CountingPayload` predicts for `owner()`.
pub fn predicted() -> Address {
    payload_builder().predict_address(&owner(), 1).unwrap()
}

pub fn deployed() -> Address {
    address!("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SwitchBehavior {
    Switch,
    Fail,
    Ignore,
}

pub struct FakeWallet {
    chain: Mutex<u64>,
    switch: SwitchBehavior,
    reject_signature: bool,
    signature: Option<Hex>,
    switch_calls: AtomicUsize,
    signed: Mutex<Option<TypedData>>,
}

impl FakeWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            chain: Mutex::new(chain_id),
            switch: SwitchBehavior::Switch,
            reject_signature: false,
            signature: None,
            switch_calls: AtomicUsize::new(0),
            signed: Mutex::new(None),
        }
    }

    pub fn failing_switch(mut self) -> Self {
        self.switch = SwitchBehavior::Fail;
        self
    }

    /// Accepts the switch request but stays on the old chain.
    pub fn ignoring_switch(mut self) -> Self {
        self.switch = SwitchBehavior::Ignore;
        self
    }

    pub fn rejecting_signature(mut self) -> Self {
        self.reject_signature = true;
        self
    }

    pub fn returning_signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn switch_calls(&self) -> usize {
        self.switch_calls.load(Ordering::SeqCst)
    }

    pub fn last_typed_data(&self) -> Option<TypedData> {
        self.signed.lock().unwrap().clone()
    }

    pub fn signature(&self) -> Hex {
        self.signature
            .clone()
            .unwrap_or_else(|| format!("0x{}", "ab".repeat(65)))
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        self.switch_calls.fetch_add(1, Ordering::SeqCst);
        match self.switch {
            SwitchBehavior::Switch => {
                *self.chain.lock().unwrap() = chain_id;
                Ok(())
            }
            SwitchBehavior::Fail => Err(SafeError::Other("user rejected the request".into())),
            SwitchBehavior::Ignore => Ok(()),
        }
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(*self.chain.lock().unwrap())
    }

    async fn address(&self) -> Result<Address> {
        Ok(owner())
    }

    async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Hex> {
        if self.reject_signature {
            return Err(SafeError::SignatureRejected("transaction rejected in wallet".into()));
        }
        *self.signed.lock().unwrap() = Some(typed_data.clone());
        Ok(self.signature())
    }
}

#[derive(Default)]
pub struct CountingPayload {
    fail: bool,
    calls: AtomicUsize,
}

impl CountingPayload {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PayloadService for CountingPayload {
    async fn get_deployment_payload(&self, owner: &Address) -> Result<DeploymentPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SafeError::Other("payload service returned 502".into()));
        }
        Ok(payload_builder().build(owner, 1))
    }
}

#[derive(Default)]
pub struct FakeRelay {
    fail: bool,
    calls: AtomicUsize,
    last: Mutex<Option<SignedRelayRequest>>,
}

impl FakeRelay {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<SignedRelayRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayService for FakeRelay {
    async fn relay_sponsored_transaction(&self, signed: SignedRelayRequest) -> Result<TaskHandle> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last.lock().unwrap() = Some(signed);
        if self.fail {
            return Err(SafeError::Other("relay rejected the request".into()));
        }
        Ok(TaskHandle {
            task_id: format!("task-{n}"),
        })
    }
}

/// Replays a fixed sequence of states, then reports `CheckPending` forever.
pub struct ScriptedStatus {
    script: Mutex<VecDeque<std::result::Result<TaskState, String>>>,
    calls: AtomicUsize,
}

impl ScriptedStatus {
    pub fn new(script: Vec<std::result::Result<TaskState, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStatusService for ScriptedStatus {
    async fn get_task_status(&self, _task: &TaskHandle) -> Result<TaskStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next.unwrap_or(Ok(TaskState::CheckPending)) {
            Ok(task_state) => Ok(TaskStatus {
                task_state,
                transaction_hash: task_state.is_terminal().then(|| TX_HASH.to_string()),
            }),
            Err(e) => Err(SafeError::Other(e)),
        }
    }
}

pub struct FixedReceipts(pub Option<Address>);

#[async_trait]
impl ReceiptSource for FixedReceipts {
    async fn deployed_safe(&self, _transaction_hash: &str) -> Result<Option<Address>> {
        Ok(self.0)
    }
}

#[derive(Default)]
pub struct FailingProfile {
    calls: AtomicUsize,
}

impl FailingProfile {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for FailingProfile {
    async fn complete_onboarding(&self, _primary_safe_address: &Address) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SafeError::Other("profile service unavailable".into()))
    }

    async fn onboarding_status(&self) -> Result<OnboardingStatus> {
        Ok(OnboardingStatus::default())
    }
}
