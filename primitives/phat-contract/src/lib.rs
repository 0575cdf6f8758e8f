//! Types shared by Phat contract clients and the confidential workers that
//! serve them.
//!
//! Everything here is SCALE encoded on the wire. Queries travel to a worker
//! inside an [`EncryptedData`] envelope; commands travel on-chain inside a
//! [`CommandPayload`] attached to a [`PushContractMessage`] call.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod account;
pub mod exec;


use alloc::{string::String, vec::Vec};
use parity_scale_codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

pub use account::{AccountId, Ss58Error, PHALA_SS58_PREFIX};
pub use exec::{
    ContractExecResult, ContractInstantiateResult, ContractResult, DispatchError,
    ExecReturnValue, InstantiateReturnValue, StorageDeposit, Weight, WeightV2, WeightVersion,
};

/// Contracts are addressed by their 32-byte account id.
pub type ContractId = AccountId;
/// 32-byte block or code hash.
pub type Hash = [u8; 32];
pub type Balance = u128;
/// Random nonce carried by queries, responses and commands.
pub type Nonce = [u8; 32];

/// AES-GCM nonce length used by every envelope.
pub const IV_LEN: usize = 12;

/// Ciphertext plus everything the holder of the peer secret needs to open it.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct EncryptedData {
    pub iv: [u8; IV_LEN],
    /// Sender's ephemeral public key.
    pub pubkey: [u8; 32],
    pub data: Vec<u8>,
}

// ========================= Queries =========================

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct InkQueryHead {
    pub nonce: Nonce,
    pub id: ContractId,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub enum InkQueryData {
    InkMessage {
        /// selector ++ SCALE encoded arguments
        payload: Vec<u8>,
        deposit: Balance,
        transfer: Balance,
        estimating: bool,
    },
    SidevmMessage(Vec<u8>),
    InkInstantiate {
        code_hash: Hash,
        salt: Vec<u8>,
        instantiate_data: Vec<u8>,
        deposit: Balance,
        transfer: Balance,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct InkQuery {
    pub head: InkQueryHead,
    pub data: InkQueryData,
}

/// Failure kinds a worker reports for a query.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub enum InkQueryError {
    BadOrigin,
    RuntimeError(String),
    /// No sidevm handler is deployed for the contract.
    SidevmNotFound,
    NoResponse,
    ServiceUnavailable,
    Timeout,
}

impl core::fmt::Display for InkQueryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BadOrigin => f.write_str("bad origin"),
            Self::RuntimeError(msg) => write!(f, "runtime error: {msg}"),
            Self::SidevmNotFound => f.write_str("missing handler: sidevm not found"),
            Self::NoResponse => f.write_str("no response"),
            Self::ServiceUnavailable => f.write_str("service unavailable"),
            Self::Timeout => f.write_str("timeout"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub enum InkQueryOk {
    /// SCALE encoded [`ContractExecResult`].
    InkMessageReturn(Vec<u8>),
    SidevmQueryReturn(Vec<u8>),
    /// SCALE encoded [`ContractInstantiateResult`].
    InkInstantiateReturn(Vec<u8>),
}

impl InkQueryOk {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::InkMessageReturn(_) => "InkMessageReturn",
            Self::SidevmQueryReturn(_) => "SidevmQueryReturn",
            Self::InkInstantiateReturn(_) => "InkInstantiateReturn",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct InkResponse {
    pub nonce: Nonce,
    pub result: Result<InkQueryOk, InkQueryError>,
}

// ========================= Commands =========================

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub enum InkCommand {
    InkMessage {
        nonce: Nonce,
        /// selector ++ SCALE encoded arguments
        message: Vec<u8>,
        transfer: Balance,
        /// ref-time component of the gas limit
        gas_limit: u64,
        storage_deposit_limit: Option<Balance>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub enum CommandPayload {
    Plain(Vec<u8>),
    Encrypted(EncryptedData),
}

/// Arguments of the on-chain `push_contract_message` call.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct PushContractMessage {
    pub contract_id: ContractId,
    /// SCALE encoded [`CommandPayload`].
    pub payload: Vec<u8>,
    /// Escrowed up front to cover transfer, gas and storage.
    pub deposit: Balance,
}

// ========================= Certificates =========================

/// Body signed by an account to delegate query signing to a session key.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo, MaxEncodedLen)]
pub struct CertificateBody {
    pub pubkey: [u8; 32],
    /// Lifetime in blocks.
    pub ttl: u32,
    pub config_bits: u32,
}
