use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod contracts;

pub use alloy::primitives::{address, keccak256, Address, Bytes, B256, U256};

/// 0x-prefixed hex string (e.g. "0x1234...").
pub type Hex = String;

/// Deployment flow error types.
///
/// Every step of a deployment attempt converts its failure into one of these
/// variants; [`SafeError::kind`] exposes the coarse taxonomy callers match on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafeError {
    #[error("an embedded wallet is required; create or connect one before deploying")]
    WalletMissing,

    #[error("failed to switch to chain {chain_id}: {reason}")]
    NetworkSwitchFailed { chain_id: u64, reason: String },

    #[error("wallet is connected to chain {actual}, but chain {expected} is required")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("failed to sign the relay request: {0}")]
    SignatureRejected(String),

    #[error("failed to request deployment payload: {0}")]
    PayloadRequestFailed(String),

    #[error("relay submission failed: {0}")]
    RelaySubmissionFailed(String),

    #[error("deployment failed: task {task_id} reverted")]
    TaskExecutionReverted {
        task_id: String,
        transaction_hash: Option<Hex>,
    },

    #[error("deployment failed: task {task_id} was cancelled")]
    TaskCancelled { task_id: String },

    #[error(
        "Safe deployed, but saving it to the profile failed: {reason}. {}",
        recovery_hint(.address, .transaction_hash)
    )]
    ProfilePersistFailed {
        address: Option<Address>,
        transaction_hash: Option<Hex>,
        reason: String,
    },

    #[error("task {task_id} did not reach a terminal state after {polls} polls")]
    PollingTimedOut { task_id: String, polls: u32 },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("{0}")]
    Other(String),
}

fn recovery_hint(address: &Option<Address>, transaction_hash: &Option<Hex>) -> String {
    match (address, transaction_hash) {
        (Some(address), _) => format!(
            "Your Safe was created at {address}; copy this address and contact support."
        ),
        (None, Some(tx)) => format!(
            "The deployment transaction is {tx}; copy it and contact support."
        ),
        (None, None) => "Please contact support.".to_string(),
    }
}

/// Coarse error taxonomy surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    WalletMissing,
    NetworkSwitchFailed,
    ChainMismatch,
    SignatureRejected,
    PayloadRequestFailed,
    RelaySubmissionFailed,
    TaskExecutionReverted,
    TaskCancelled,
    ProfilePersistFailed,
    PollingTimedOut,
    InvalidInput,
    Other,
}

impl SafeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SafeError::WalletMissing => ErrorKind::WalletMissing,
            SafeError::NetworkSwitchFailed { .. } => ErrorKind::NetworkSwitchFailed,
            SafeError::ChainMismatch { .. } => ErrorKind::ChainMismatch,
            SafeError::SignatureRejected(_) => ErrorKind::SignatureRejected,
            SafeError::PayloadRequestFailed(_) => ErrorKind::PayloadRequestFailed,
            SafeError::RelaySubmissionFailed(_) => ErrorKind::RelaySubmissionFailed,
            SafeError::TaskExecutionReverted { .. } => ErrorKind::TaskExecutionReverted,
            SafeError::TaskCancelled { .. } => ErrorKind::TaskCancelled,
            SafeError::ProfilePersistFailed { .. } => ErrorKind::ProfilePersistFailed,
            SafeError::PollingTimedOut { .. } => ErrorKind::PollingTimedOut,
            SafeError::InvalidAddress(_) | SafeError::InvalidHex(_) => ErrorKind::InvalidInput,
            SafeError::Other(_) => ErrorKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SafeError>;

/// Parse a 0x-prefixed, 40 hex digit address. Mixed case is accepted without
/// a checksum check.
pub fn parse_address(s: &str) -> Result<Address> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| SafeError::InvalidAddress(s.to_string()))?;
    if digits.len() != 40 {
        return Err(SafeError::InvalidAddress(s.to_string()));
    }
    digits
        .parse()
        .map_err(|_| SafeError::InvalidAddress(s.to_string()))
}

/// Parse a decimal integer string (wire form of `value` fields) into a uint256.
pub fn parse_u256(value: &str) -> Result<U256> {
    U256::from_str_radix(value.trim(), 10)
        .map_err(|_| SafeError::Other(format!("invalid decimal value: {value:?}")))
}

/// Parse 0x-prefixed hex into bytes.
pub fn parse_bytes(s: &str) -> Result<Bytes> {
    if !s.starts_with("0x") {
        return Err(SafeError::InvalidHex(s.to_string()));
    }
    s.parse().map_err(|e| SafeError::InvalidHex(format!("{s}: {e}")))
}
