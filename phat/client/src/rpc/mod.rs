//! Seams to the outside world: the chain node, the worker and whatever signs
//! and submits extrinsics.
//!
//! The worker speaks prpc with JSON bodies; byte fields travel as hex
//! strings.

pub mod http;

use async_trait::async_trait;
use phat_contract_primitives::{Hash, PushContractMessage};
use serde::{Deserialize, Serialize};

use crate::{submittable::TxInclusion, Error, Result};

pub use http::{HttpWorkerClient, JsonRpcChainClient};

#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Height of the block with the given hash.
    async fn block_number(&self, hash: Hash) -> Result<u32>;
}

#[async_trait]
pub trait WorkerRpc: Send + Sync {
    async fn get_info(&self) -> Result<PhactoryInfo>;

    async fn contract_query(&self, request: ContractQueryRequest) -> Result<ContractQueryResponse>;
}

/// Signs and submits `push_contract_message` extrinsics.
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit(&self, call: &PushContractMessage) -> Result<TxInclusion>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhactoryInfo {
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub registered: bool,
    /// Next block the worker will process.
    #[serde(default)]
    pub blocknum: u32,
    #[serde(default)]
    pub headernum: u32,
    #[serde(default)]
    pub ecdh_public_key: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl PhactoryInfo {
    pub fn ecdh_public_key(&self) -> Result<Option<[u8; 32]>> {
        let Some(text) = self.ecdh_public_key.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let mut key = [0u8; 32];
        hex::decode_to_slice(text.trim_start_matches("0x"), &mut key)
            .map_err(|e| Error::Transport(format!("malformed ecdh_public_key: {e}")))?;
        Ok(Some(key))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum SignatureType {
    Ed25519,
    Sr25519,
    Ecdsa,
}

impl From<SignatureType> for i32 {
    fn from(ty: SignatureType) -> Self {
        match ty {
            SignatureType::Ed25519 => 0,
            SignatureType::Sr25519 => 1,
            SignatureType::Ecdsa => 2,
        }
    }
}

impl TryFrom<i32> for SignatureType {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ed25519),
            1 => Ok(Self::Sr25519),
            2 => Ok(Self::Ecdsa),
            other => Err(format!("unknown signature type {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateProto {
    #[serde(with = "hex_bytes")]
    pub encoded_body: Vec<u8>,
    pub signature: Option<Box<RequestSignature>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSignature {
    pub signed_by: Option<Box<CertificateProto>>,
    pub signature_type: SignatureType,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractQueryRequest {
    /// SCALE encoded `EncryptedData`.
    #[serde(with = "hex_bytes")]
    pub encoded_encrypted_data: Vec<u8>,
    pub signature: Option<RequestSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractQueryResponse {
    #[serde(with = "hex_bytes")]
    pub encoded_encrypted_data: Vec<u8>,
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
