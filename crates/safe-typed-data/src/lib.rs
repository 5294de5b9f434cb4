//! EIP-712 typed data for sponsored relay requests.
//!
//! - Domain: name, version, chainId, verifyingContract
//! - Primary type: `ForwardRequest(uint256 chainId,address target,bytes data,uint256 value)`
//! - Signing hash: keccak256(0x1901 || domainSeparator || hashStruct(message))
//!
//! Hashing goes through `alloy`'s `SolStruct`; the structs here are the JSON
//! form handed to `eth_signTypedData_v4`.

use std::collections::BTreeMap;

use alloy::sol_types::{eip712_domain, SolStruct};
use serde::{Deserialize, Serialize};
use safe_types::{address, parse_u256, Address, Bytes, B256, Result, U256};

/// Domain name expected by the relay's ERC-2771 forwarder.
pub const RELAY_DOMAIN_NAME: &str = "GelatoRelayERC2771";
pub const RELAY_DOMAIN_VERSION: &str = "1";
/// Verifying contract of the relay's ERC-2771 forwarder.
pub const RELAY_VERIFYING_CONTRACT: Address = address!("d8253782c45a12053594b9fe356782de4236bf0e");

pub const FORWARD_REQUEST_PRIMARY_TYPE: &str = "ForwardRequest";

mod abi {
    alloy::sol! {
        struct ForwardRequest {
            uint256 chainId;
            address target;
            bytes data;
            uint256 value;
        }
    }
}

/// One `{name, type}` entry of a typed-data schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedDataField {
    fn new(name: &str, ty: &str) -> Self {
        Self { name: name.into(), ty: ty.into() }
    }
}

/// EIP-712 domain descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// The relay forwarder domain on the given chain.
    pub fn relay(chain_id: u64) -> Self {
        Self {
            name: RELAY_DOMAIN_NAME.into(),
            version: RELAY_DOMAIN_VERSION.into(),
            chain_id,
            verifying_contract: RELAY_VERIFYING_CONTRACT,
        }
    }

    pub fn fields() -> Vec<TypedDataField> {
        vec![
            TypedDataField::new("name", "string"),
            TypedDataField::new("version", "string"),
            TypedDataField::new("chainId", "uint256"),
            TypedDataField::new("verifyingContract", "address"),
        ]
    }

    fn to_sol(&self) -> alloy::sol_types::Eip712Domain {
        eip712_domain! {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
        }
    }
}

/// The message being signed: a forward request to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
    pub chain_id: u64,
    pub target: Address,
    pub data: Bytes,
    /// Decimal uint256.
    pub value: String,
}

impl ForwardRequest {
    pub fn fields() -> Vec<TypedDataField> {
        vec![
            TypedDataField::new("chainId", "uint256"),
            TypedDataField::new("target", "address"),
            TypedDataField::new("data", "bytes"),
            TypedDataField::new("value", "uint256"),
        ]
    }

    fn to_sol(&self) -> Result<abi::ForwardRequest> {
        Ok(abi::ForwardRequest {
            chainId: U256::from(self.chain_id),
            target: self.target,
            data: self.data.clone(),
            value: parse_u256(&self.value)?,
        })
    }
}

/// A complete `eth_signTypedData_v4` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub types: BTreeMap<String, Vec<TypedDataField>>,
    pub primary_type: String,
    pub domain: Eip712Domain,
    pub message: ForwardRequest,
}

impl TypedData {
    pub fn forward_request(domain: Eip712Domain, message: ForwardRequest) -> Self {
        let mut types = BTreeMap::new();
        types.insert("EIP712Domain".to_string(), Eip712Domain::fields());
        types.insert(FORWARD_REQUEST_PRIMARY_TYPE.to_string(), ForwardRequest::fields());
        Self {
            types,
            primary_type: FORWARD_REQUEST_PRIMARY_TYPE.into(),
            domain,
            message,
        }
    }

    /// The digest a wallet signs for this payload.
    pub fn signing_hash(&self) -> Result<B256> {
        Ok(self.message.to_sol()?.eip712_signing_hash(&self.domain.to_sol()))
    }

    /// JSON string form accepted by `eth_signTypedData_v4`.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
