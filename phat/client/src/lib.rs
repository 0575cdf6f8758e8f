//! # phat-contract-client
//!
//! Calls ink! contracts deployed to a Phat contract cluster.
//!
//! - **Queries** are read-only. They are encrypted for the worker's ECDH key,
//!   signed with a [`Certificate`] session key and answered by the worker
//!   directly, without touching the chain.
//! - **Commands** mutate state. They are encrypted for the contract's own key
//!   and travel on-chain inside a `push_contract_message` call together with a
//!   deposit covering transfer, gas and storage.
//!
//! Every call generates its own ephemeral keypair, so concurrent calls share
//! no key material.
//!
//! ```rust,ignore
//! let registry = PhatRegistry::connect(chain, worker, cluster, ClientConfig::default()).await?;
//! let contract = PhatContract::new(registry, abi, address, &contract_key)?;
//!
//! let cert = Certificate::sign_with(&alice, defaults::CERTIFICATE_TTL);
//! let origin = *cert.account();
//! let value = contract
//!     .query::<Result<bool, u8>>("get", &origin, &QueryOptions::with_cert(&cert), &[])
//!     .await?;
//!
//! let mut result = contract
//!     .command("flip", &CommandOptions::default(), &[])?
//!     .sign_and_send(&submitter)
//!     .await?;
//! result.wait_finalized(None).await?;
//! ```

pub mod abi;
pub mod cert;
pub mod clock;
pub mod command;
pub mod config;
pub mod contract;
pub mod error;
pub mod query;
pub mod registry;
pub mod rpc;
pub mod submittable;

#[cfg(test)]
mod mock;

pub use abi::{ContractAbi, DecodedEvent, MessageSpec};
pub use cert::Certificate;
pub use clock::{Clock, TokioClock};
pub use command::{compute_deposit, CommandOptions, ContractCommand};
pub use config::{defaults, ClientConfig};
pub use contract::PhatContract;
pub use error::{Error, Result};
pub use query::{ContractQueryResult, QueryOptions};
pub use registry::{ClusterInfo, PhatRegistry};
pub use rpc::{ChainRpc, HttpWorkerClient, JsonRpcChainClient, TxSubmitter, WorkerRpc};
pub use submittable::{
    ContractSubmittableResult, EventRecord, RemoteFinalization, TxInclusion, TxStatus,
};
