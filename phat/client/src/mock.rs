use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use parity_scale_codec::{Decode, Encode};
use phat_contract_primitives::{
    ContractExecResult, ContractResult, EncryptedData, ExecReturnValue, Hash, InkQuery,
    InkQueryError, InkQueryOk, InkResponse, PushContractMessage, StorageDeposit, Weight,
    WeightVersion,
};
use phat_crypto::Keypair;
use rand::rngs::OsRng;

use crate::{
    clock::Clock,
    rpc::{
        ChainRpc, ContractQueryRequest, ContractQueryResponse, PhactoryInfo, TxSubmitter,
        WorkerRpc,
    },
    submittable::TxInclusion,
    ClientConfig, ClusterInfo, ContractAbi, Error, PhatContract, PhatRegistry, Result,
};

pub const GAS_PRICE: u128 = 3;
pub const CLUSTER_ID: Hash = [0xc1; 32];
pub const CONTRACT_ADDRESS: [u8; 32] = [0xca; 32];

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
        "returnType": { "displayName": ["ink", "MessageResult"], "type": 2 }, "docs": [] },
      { "label": "ping", "selector": "0x0000beef", "mutates": false, "payable": false, "args": [],
        "returnType": null, "docs": [] }
    ],
    "events": [
      { "label": "Flipped", "args": [ { "label": "value", "type": { "displayName": ["bool"], "type": 0 }, "indexed": false } ], "docs": [] },
      { "label": "Pinged", "args": [], "docs": [] }
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

type Handler = Box<dyn Fn(&InkQuery) -> Result<InkQueryOk, InkQueryError> + Send + Sync>;

/// Worker that decrypts queries and answers with whatever the handler says.
pub struct MockWorker {
    pub keypair: Keypair,
    info: Mutex<PhactoryInfo>,
    blocknums: Mutex<VecDeque<u32>>,
    handler: Mutex<Handler>,
    /// Corrupts the echoed nonce when set.
    pub tamper_nonce: Mutex<bool>,
    pub queries: Mutex<Vec<InkQuery>>,
    pub envelopes: Mutex<Vec<EncryptedData>>,
    pub requests: Mutex<Vec<ContractQueryRequest>>,
    pub info_calls: Mutex<usize>,
}

impl Default for MockWorker {
    fn default() -> Self {
        let keypair = Keypair::from_seed(&[0x77; 32]).expect("valid seed");
        let info = PhactoryInfo {
            initialized: true,
            registered: true,
            blocknum: 1,
            headernum: 1,
            ecdh_public_key: Some(hex::encode(keypair.public().as_bytes())),
            version: Some("2.1.0".into()),
        };
        Self {
            keypair,
            info: Mutex::new(info),
            blocknums: Mutex::new(VecDeque::new()),
            handler: Mutex::new(Box::new(|_| Err(InkQueryError::NoResponse))),
            tamper_nonce: Mutex::new(false),
            queries: Mutex::new(Vec::new()),
            envelopes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            info_calls: Mutex::new(0),
        }
    }
}

impl MockWorker {
    pub fn respond_with(
        &self,
        handler: impl Fn(&InkQuery) -> Result<InkQueryOk, InkQueryError> + Send + Sync + 'static,
    ) {
        *self.handler.lock().unwrap() = Box::new(handler);
    }

    pub fn set_info(&self, info: PhactoryInfo) {
        *self.info.lock().unwrap() = info;
    }

    /// Block heights returned by successive `get_info` calls; the last one
    /// sticks.
    pub fn script_blocknums(&self, heights: impl IntoIterator<Item = u32>) {
        *self.blocknums.lock().unwrap() = heights.into_iter().collect();
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl WorkerRpc for MockWorker {
    async fn get_info(&self) -> Result<PhactoryInfo> {
        *self.info_calls.lock().unwrap() += 1;
        let mut info = self.info.lock().unwrap();
        let mut scripted = self.blocknums.lock().unwrap();
        if let Some(next) = scripted.pop_front() {
            info.blocknum = next;
        }
        Ok(info.clone())
    }

    async fn contract_query(&self, request: ContractQueryRequest) -> Result<ContractQueryResponse> {
        let envelope = EncryptedData::decode(&mut &request.encoded_encrypted_data[..])?;
        let (key, plaintext) = phat_crypto::open_with(&self.keypair, &envelope)?;
        let query = InkQuery::decode(&mut &plaintext[..])?;

        let result = {
            let handler = self.handler.lock().unwrap();
            (*handler)(&query)
        };
        let mut nonce = query.head.nonce;
        if *self.tamper_nonce.lock().unwrap() {
            nonce[0] ^= 0xff;
        }
        let response = InkResponse { nonce, result };
        let reply = phat_crypto::seal(&self.keypair, &key, &response.encode(), &mut OsRng)?;

        self.envelopes.lock().unwrap().push(envelope);
        self.queries.lock().unwrap().push(query);
        self.requests.lock().unwrap().push(request);
        Ok(ContractQueryResponse { encoded_encrypted_data: reply.encode() })
    }
}

#[derive(Default)]
pub struct MockChain {
    pub blocks: Mutex<HashMap<Hash, u32>>,
}

impl MockChain {
    pub fn with_block(hash: Hash, number: u32) -> Self {
        let chain = Self::default();
        chain.blocks.lock().unwrap().insert(hash, number);
        chain
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn block_number(&self, hash: Hash) -> Result<u32> {
        self.blocks
            .lock()
            .unwrap()
            .get(&hash)
            .copied()
            .ok_or_else(|| Error::Transport("unknown block".into()))
    }
}

pub struct MockSubmitter {
    pub inclusion: TxInclusion,
    pub submitted: Mutex<Vec<PushContractMessage>>,
}

impl MockSubmitter {
    pub fn new(inclusion: TxInclusion) -> Self {
        Self { inclusion, submitted: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl TxSubmitter for MockSubmitter {
    async fn submit(&self, call: &PushContractMessage) -> Result<TxInclusion> {
        self.submitted.lock().unwrap().push(call.clone());
        Ok(self.inclusion.clone())
    }
}

/// Virtual time: sleeping advances the clock instantly.
#[derive(Default)]
pub struct MockClock {
    now: Mutex<Duration>,
    pub sleeps: Mutex<usize>,
}

#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
        *self.sleeps.lock().unwrap() += 1;
    }
}

pub struct TestEnv {
    pub worker: Arc<MockWorker>,
    pub chain: Arc<MockChain>,
    pub clock: Arc<MockClock>,
    pub registry: Arc<PhatRegistry>,
    pub contract: PhatContract,
    pub contract_keypair: Keypair,
}

pub async fn new_test_env(chain: MockChain) -> TestEnv {
    let worker = Arc::new(MockWorker::default());
    let chain = Arc::new(chain);
    let clock = Arc::new(MockClock::default());
    let cluster = ClusterInfo { id: CLUSTER_ID, gas_price: GAS_PRICE };
    let registry = PhatRegistry::connect_with_clock(
        chain.clone(),
        worker.clone(),
        cluster,
        ClientConfig::default(),
        clock.clone(),
    )
    .await
    .expect("registry connects");

    let abi = Arc::new(ContractAbi::from_json(FLIPPER_METADATA).expect("metadata parses"));
    let contract_keypair = Keypair::from_seed(&[0x55; 32]).expect("valid seed");
    let contract = PhatContract::new(
        registry.clone(),
        abi,
        CONTRACT_ADDRESS.into(),
        contract_keypair.public().as_bytes(),
    )
    .expect("valid contract key");

    TestEnv { worker, chain, clock, registry, contract, contract_keypair }
}

pub fn exec_result(
    gas_consumed: Weight,
    gas_required: Weight,
    result: core::result::Result<ExecReturnValue, phat_contract_primitives::DispatchError>,
) -> ContractExecResult {
    ContractResult {
        gas_consumed,
        gas_required,
        storage_deposit: StorageDeposit::Charge(500),
        debug_message: b"ok".to_vec(),
        result,
    }
}

pub fn message_return(exec: &ContractExecResult) -> InkQueryOk {
    InkQueryOk::InkMessageReturn(exec.encode_with(WeightVersion::V2))
}
