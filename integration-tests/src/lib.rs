//! End-to-end tests for the Phat contract client.
//!
//! Instead of a live network the tests run against [`LocalCluster`]: a chain
//! and a single worker hosting a flipper contract, both in-process. The
//! worker really decrypts queries, checks the certificate chain and seals
//! its replies; the chain really decrypts commands with the contract key.
//! Worker block sync is explicit, so finalisation can be observed step by
//! step.
//!
//! [`http_stub`] serves the same cluster over the worker's prpc JSON
//! interface and the node's JSON-RPC, which exercises the HTTP clients.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p integration-tests
//!
//! # Run with logging
//! RUST_LOG=debug cargo test -p integration-tests -- --nocapture
//! ```

pub mod cluster;
pub mod http_stub;

use std::sync::Arc;

use anyhow::Result;
use phat_contract_client::{
    ClientConfig, ClusterInfo, ContractAbi, PhatContract, PhatRegistry,
};
use phat_crypto::Keypair;

pub use cluster::LocalCluster;

pub const GAS_PRICE: u128 = 5;
pub const CLUSTER_ID: [u8; 32] = [0x0c; 32];

pub const FLIP: [u8; 4] = [0x63, 0x3a, 0xa5, 0x51];
pub const GET: [u8; 4] = [0x2f, 0x86, 0x5b, 0xd9];

pub const FLIPPER_METADATA: &str = r#"{
  "source": { "hash": "0x00", "language": "ink! 4.3.0", "compiler": "rustc 1.74.0" },
  "contract": { "name": "flipper", "version": "0.1.0", "authors": [] },
  "spec": {
    "constructors": [
      { "label": "new", "selector": "0x9bae9d5e", "payable": false,
        "args": [ { "label": "init_value", "type": { "displayName": ["bool"], "type": 0 } } ],
        "returnType": { "displayName": ["ink_primitives", "ConstructorResult"], "type": 1 }, "docs": [] }
    ],
    "messages": [
      { "label": "flip", "selector": "0x633aa551", "mutates": true, "payable": false, "args": [],
        "returnType": { "displayName": ["ink", "MessageResult"], "type": 1 }, "docs": [] },
      { "label": "get", "selector": "0x2f865bd9", "mutates": false, "payable": false, "args": [],
        "returnType": { "displayName": ["ink", "MessageResult"], "type": 2 }, "docs": [] }
    ],
    "events": [
      { "label": "Flipped", "args": [ { "label": "value", "type": { "displayName": ["bool"], "type": 0 }, "indexed": false } ], "docs": [] }
    ]
  },
  "types": [
    { "id": 0, "type": { "def": { "primitive": "bool" } } },
    { "id": 1, "type": { "path": ["Result"], "params": [ { "name": "T", "type": 3 }, { "name": "E", "type": 4 } ],
      "def": { "variant": { "variants": [
        { "name": "Ok", "fields": [ { "type": 3 } ], "index": 0 },
        { "name": "Err", "fields": [ { "type": 4 } ], "index": 1 } ] } } } },
    { "id": 2, "type": { "path": ["Result"], "params": [ { "name": "T", "type": 0 }, { "name": "E", "type": 4 } ],
      "def": { "variant": { "variants": [
        { "name": "Ok", "fields": [ { "type": 0 } ], "index": 0 },
        { "name": "Err", "fields": [ { "type": 4 } ], "index": 1 } ] } } } },
    { "id": 3, "type": { "def": { "tuple": [] } } },
    { "id": 4, "type": { "path": ["ink_primitives", "LangError"],
      "def": { "variant": { "variants": [ { "name": "CouldNotReadInput", "index": 1 } ] } } } }
  ],
  "version": "4"
}"#;

/// Dev accounts with well-known seeds.
pub mod test_accounts {
    use phat_crypto::Keypair;

    pub const ALICE_SEED: [u8; 32] = [
        0xe5, 0xbe, 0x9a, 0x50, 0x92, 0xb8, 0x1b, 0xca, 0x64, 0xbe, 0x81, 0xd2, 0x12, 0xe7, 0xf2,
        0xf9, 0xeb, 0xa1, 0x83, 0xbb, 0x7a, 0x90, 0x95, 0x4f, 0x7b, 0x76, 0x36, 0x1f, 0x6e, 0xdb,
        0x5c, 0x0a,
    ];

    pub fn from_seed(seed: &[u8; 32]) -> Keypair {
        Keypair::from_seed(seed).expect("every 32-byte seed is a valid mini secret")
    }

    pub fn alice() -> Keypair {
        from_seed(&ALICE_SEED)
    }

    pub fn bob() -> Keypair {
        from_seed(&[0xb0; 32])
    }

    /// Not registered with any cluster.
    pub fn eve() -> Keypair {
        from_seed(&[0xee; 32])
    }
}

/// Registry and flipper handle wired to `cluster` through the in-process
/// seams.
pub async fn connect(
    cluster: &Arc<LocalCluster>,
    config: ClientConfig,
) -> Result<(Arc<PhatRegistry>, PhatContract)> {
    let registry = PhatRegistry::connect(
        cluster.clone(),
        cluster.clone(),
        ClusterInfo { id: CLUSTER_ID, gas_price: GAS_PRICE },
        config,
    )
    .await?;
    let contract = open_flipper(registry.clone(), cluster)?;
    Ok((registry, contract))
}

pub fn open_flipper(registry: Arc<PhatRegistry>, cluster: &LocalCluster) -> Result<PhatContract> {
    let abi = Arc::new(ContractAbi::from_json(FLIPPER_METADATA)?);
    Ok(PhatContract::new(registry, abi, cluster.contract_id(), cluster.contract_key())?)
}

/// Config with a short poll interval so real-time waits stay quick.
pub fn fast_config() -> ClientConfig {
    ClientConfig { finalize_timeout_ms: 2_000, poll_interval_ms: 10, ..Default::default() }
}

/// Keypairs whose public keys the cluster accepts as certificate roots.
pub fn registered_accounts() -> Vec<Keypair> {
    vec![test_accounts::alice(), test_accounts::bob()]
}
