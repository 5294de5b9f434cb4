//! Executed transaction history for a Safe.
//!
//! Fetches from the Safe transaction service and flattens each entry into a
//! `TransactionItem` classified as incoming, outgoing, module or creation.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use safe_types::{Address, Hex};

pub mod history_client;

pub use history_client::SafeHistoryClient;

/// Transaction type as reported by the transaction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceTxType {
    EthereumTransaction,
    ModuleTransaction,
    MultisigTransaction,
    /// A type this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Token metadata. NFTs and unverified tokens may lack symbol or decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDecoded {
    pub method: String,
}

/// One entry of `all-transactions` as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTransaction {
    #[serde(rename = "txType", alias = "type")]
    pub tx_type: ServiceTxType,
    #[serde(default)]
    pub tx_hash: Option<Hex>,
    #[serde(default)]
    pub execution_date: Option<String>,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub token_info: Option<TokenInfo>,
    #[serde(default)]
    pub data_decoded: Option<DataDecoded>,
    #[serde(default)]
    pub safe_tx_hash: Option<Hex>,
    #[serde(default)]
    pub is_executed: Option<bool>,
}

/// Paged list wrapper used by the transaction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Incoming,
    Outgoing,
    Module,
    Creation,
}

/// Flattened transaction for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub hash: Hex,
    /// Unix milliseconds.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_decimals: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

pub fn parse_timestamp_ms(iso: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(iso).ok().map(|d| d.timestamp_millis())
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty() && v != "0")
}

/// Classify and flatten a service entry.
///
/// Unexecuted multisig transactions, entries of an unknown type and entries
/// without a hash or execution date are skipped.
pub fn map_transaction(tx: &ServiceTransaction, safe: &Address) -> Option<TransactionItem> {
    let kind = match tx.tx_type {
        ServiceTxType::MultisigTransaction => {
            if !tx.is_executed.unwrap_or(false) {
                return None;
            }
            TransactionKind::Module
        }
        ServiceTxType::EthereumTransaction => {
            if tx.to.as_ref() == Some(safe) {
                TransactionKind::Incoming
            } else if has_value(&tx.value) {
                TransactionKind::Outgoing
            } else {
                TransactionKind::Module
            }
        }
        ServiceTxType::ModuleTransaction => TransactionKind::Module,
        ServiceTxType::Unknown => return None,
    };

    let hash = tx.tx_hash.clone().or_else(|| tx.safe_tx_hash.clone())?;
    let timestamp = tx.execution_date.as_deref().and_then(parse_timestamp_ms)?;

    Some(TransactionItem {
        kind,
        hash,
        timestamp,
        from: tx.from,
        to: tx.to,
        value: tx.value.clone(),
        token_address: tx.token_info.as_ref().map(|t| t.address),
        token_symbol: tx.token_info.as_ref().and_then(|t| t.symbol.clone()),
        token_decimals: tx.token_info.as_ref().and_then(|t| t.decimals),
        method_name: tx.data_decoded.as_ref().map(|d| d.method.clone()),
    })
}
