//! In-process chain plus one worker running a flipper contract.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use parity_scale_codec::{Decode, Encode};
use phat_contract_client::{
    rpc::{ContractQueryRequest, ContractQueryResponse, PhactoryInfo, RequestSignature},
    ChainRpc, Error, EventRecord, Result, TxInclusion, TxStatus, TxSubmitter, WorkerRpc,
};
use phat_contract_primitives::{
    AccountId, CertificateBody, CommandPayload, ContractExecResult, ContractId,
    ContractInstantiateResult, ContractResult, DispatchError, EncryptedData, ExecReturnValue, Hash,
    InkCommand, InkQuery, InkQueryData, InkQueryError, InkQueryOk, InkResponse,
    InstantiateReturnValue, PushContractMessage, StorageDeposit, Weight, WeightV2, WeightVersion,
};
use phat_crypto::{Keypair, PublicKey, SIGNATURE_LEN};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{test_accounts, FLIP, GET};

const SIGNING_CONTEXT: &[u8] = b"substrate";

pub const QUERY_GAS: WeightV2 = WeightV2 { ref_time: 2_000_000, proof_size: 4_096 };
pub const QUERY_GAS_REQUIRED: WeightV2 = WeightV2 { ref_time: 3_000_000, proof_size: 8_192 };
pub const FLIP_STORAGE_CHARGE: u128 = 100;

struct ChainState {
    /// Flipper value after each block; index 0 is genesis.
    values: Vec<bool>,
    blocks: HashMap<Hash, u32>,
    /// Next block the worker will process.
    worker_next: u32,
    syncing: bool,
    /// Fails every query with this error when set.
    outage: Option<InkQueryError>,
    queries: usize,
    submitted: Vec<PushContractMessage>,
}

pub struct LocalCluster {
    worker: Keypair,
    contract: Keypair,
    contract_id: ContractId,
    accounts: Vec<PublicKey>,
    state: Mutex<ChainState>,
}

pub fn block_hash(number: u32) -> Hash {
    let mut hash = [0xbb; 32];
    hash[..4].copy_from_slice(&number.to_be_bytes());
    hash
}

impl LocalCluster {
    /// A cluster whose flipper starts at `initial`. Only certificates rooted
    /// in one of `accounts` are accepted.
    pub fn new(initial: bool, accounts: &[Keypair]) -> Self {
        let mut blocks = HashMap::new();
        blocks.insert(block_hash(0), 0);
        Self {
            worker: test_accounts::from_seed(&[0x11; 32]),
            contract: test_accounts::from_seed(&[0x22; 32]),
            contract_id: AccountId::new([0xf1; 32]),
            accounts: accounts.iter().map(|k| *k.public()).collect(),
            state: Mutex::new(ChainState {
                values: vec![initial],
                blocks,
                worker_next: 1,
                syncing: true,
                outage: None,
                queries: 0,
                submitted: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contract_id(&self) -> ContractId {
        self.contract_id
    }

    pub fn contract_key(&self) -> &[u8; 32] {
        self.contract.public().as_bytes()
    }

    /// While paused the worker stops following the chain.
    pub fn set_syncing(&self, syncing: bool) {
        self.state().syncing = syncing;
    }

    pub fn set_outage(&self, outage: Option<InkQueryError>) {
        self.state().outage = outage;
    }

    pub fn chain_height(&self) -> u32 {
        self.state().values.len() as u32 - 1
    }

    pub fn worker_height(&self) -> u32 {
        self.state().worker_next
    }

    /// Flipper value as of the chain head.
    pub fn chain_value(&self) -> bool {
        self.state().values.last().copied().unwrap_or_default()
    }

    pub fn query_count(&self) -> usize {
        self.state().queries
    }

    pub fn submitted(&self) -> Vec<PushContractMessage> {
        self.state().submitted.clone()
    }

    fn authenticate(&self, request: &ContractQueryRequest) -> bool {
        let Some(signature) = &request.signature else {
            return false;
        };
        let Some(cert) = &signature.signed_by else {
            return false;
        };
        let Ok(body) = CertificateBody::decode(&mut &cert.encoded_body[..]) else {
            return false;
        };
        let Ok(session) = PublicKey::from_bytes(&body.pubkey) else {
            return false;
        };
        if !check(&session, &request.encoded_encrypted_data, signature) {
            return false;
        }
        match cert.signature.as_deref() {
            Some(root) if root.signed_by.is_none() => {
                self.accounts.iter().any(|account| check(account, &cert.encoded_body, root))
            }
            _ => false,
        }
    }

    fn dispatch(&self, query: &InkQuery) -> Result<InkQueryOk, InkQueryError> {
        let visible = {
            let state = self.state();
            if let Some(outage) = &state.outage {
                return Err(outage.clone());
            }
            state.values[state.worker_next as usize - 1]
        };
        match &query.data {
            InkQueryData::InkMessage { payload, estimating, .. } => {
                if query.head.id != self.contract_id {
                    return Err(InkQueryError::RuntimeError("contract not found".into()));
                }
                let (result, charge) = match payload.get(..4) {
                    Some(selector) if selector == GET => (Ok(exec_ok(Ok::<bool, u8>(visible))), 0),
                    Some(selector) if selector == FLIP => {
                        debug!(estimating, "dry-running flip");
                        (Ok(exec_ok(Ok::<(), u8>(()))), FLIP_STORAGE_CHARGE)
                    }
                    _ => (Err(DispatchError::Other), 0),
                };
                let exec: ContractExecResult = ContractResult {
                    gas_consumed: Weight::V2(QUERY_GAS),
                    gas_required: Weight::V2(QUERY_GAS_REQUIRED),
                    storage_deposit: StorageDeposit::Charge(charge),
                    debug_message: Vec::new(),
                    result,
                };
                Ok(InkQueryOk::InkMessageReturn(exec.encode_with(WeightVersion::V2)))
            }
            InkQueryData::InkInstantiate { code_hash, salt, .. } => {
                let account_id: [u8; 32] =
                    Sha256::new().chain_update(code_hash).chain_update(salt).finalize().into();
                // Old runtimes leave gas_required unset.
                let exec: ContractInstantiateResult = ContractResult {
                    gas_consumed: Weight::V2(QUERY_GAS),
                    gas_required: Weight::V2(WeightV2::default()),
                    storage_deposit: StorageDeposit::Charge(FLIP_STORAGE_CHARGE),
                    debug_message: Vec::new(),
                    result: Ok(InstantiateReturnValue {
                        result: ExecReturnValue { flags: 0, data: Vec::new() },
                        account_id: AccountId::new(account_id),
                    }),
                };
                Ok(InkQueryOk::InkInstantiateReturn(exec.encode_with(WeightVersion::V2)))
            }
            InkQueryData::SidevmMessage(_) => Err(InkQueryError::SidevmNotFound),
        }
    }

    fn open_command(&self, call: &PushContractMessage) -> Option<InkCommand> {
        let plaintext = match CommandPayload::decode(&mut &call.payload[..]).ok()? {
            CommandPayload::Plain(bytes) => bytes,
            CommandPayload::Encrypted(envelope) => {
                phat_crypto::open_with(&self.contract, &envelope).ok()?.1
            }
        };
        InkCommand::decode(&mut &plaintext[..]).ok()
    }
}

fn check(public: &PublicKey, message: &[u8], signature: &RequestSignature) -> bool {
    let Ok(sig) = <[u8; SIGNATURE_LEN]>::try_from(signature.signature.as_slice()) else {
        return false;
    };
    phat_crypto::verify(public, SIGNING_CONTEXT, message, &sig)
}

fn exec_ok(value: impl Encode) -> ExecReturnValue {
    ExecReturnValue { flags: 0, data: value.encode() }
}

#[async_trait]
impl WorkerRpc for LocalCluster {
    async fn get_info(&self) -> Result<PhactoryInfo> {
        let mut state = self.state();
        let head = state.values.len() as u32 - 1;
        if state.syncing && state.worker_next <= head {
            state.worker_next += 1;
        }
        Ok(PhactoryInfo {
            initialized: true,
            registered: true,
            blocknum: state.worker_next,
            headernum: head + 1,
            ecdh_public_key: Some(format!("0x{}", hex::encode(self.worker.public().as_bytes()))),
            version: Some("local".into()),
        })
    }

    async fn contract_query(&self, request: ContractQueryRequest) -> Result<ContractQueryResponse> {
        let envelope = EncryptedData::decode(&mut &request.encoded_encrypted_data[..])?;
        let (key, plaintext) = phat_crypto::open_with(&self.worker, &envelope)?;
        let query = InkQuery::decode(&mut &plaintext[..])?;
        self.state().queries += 1;

        let result = if self.authenticate(&request) {
            self.dispatch(&query)
        } else {
            Err(InkQueryError::BadOrigin)
        };
        let response = InkResponse { nonce: query.head.nonce, result };
        let reply = phat_crypto::seal(&self.worker, &key, &response.encode(), &mut OsRng)?;
        Ok(ContractQueryResponse { encoded_encrypted_data: reply.encode() })
    }
}

#[async_trait]
impl ChainRpc for LocalCluster {
    async fn block_number(&self, hash: Hash) -> Result<u32> {
        self.state()
            .blocks
            .get(&hash)
            .copied()
            .ok_or_else(|| Error::Transport(format!("unknown block 0x{}", hex::encode(hash))))
    }
}

#[async_trait]
impl TxSubmitter for LocalCluster {
    /// Includes each accepted call in a block of its own.
    async fn submit(&self, call: &PushContractMessage) -> Result<TxInclusion> {
        let command = (call.contract_id == self.contract_id)
            .then(|| self.open_command(call))
            .flatten();
        let mut state = self.state();
        state.submitted.push(call.clone());
        let Some(InkCommand::InkMessage { message, .. }) = command else {
            return Ok(TxInclusion { status: TxStatus::Invalid, events: Vec::new() });
        };

        let current = state.values.last().copied().unwrap_or_default();
        let flipped = message.get(..4) == Some(&FLIP[..]);
        let value = if flipped { !current } else { current };
        state.values.push(value);
        let number = state.values.len() as u32 - 1;
        let hash = block_hash(number);
        state.blocks.insert(hash, number);
        info!(number, value, "included command");

        let mut events = vec![EventRecord {
            pallet: "System".into(),
            variant: "ExtrinsicSuccess".into(),
            contract: None,
            data: Vec::new(),
        }];
        if flipped {
            events.push(EventRecord {
                pallet: "Contracts".into(),
                variant: "ContractEmitted".into(),
                contract: Some(self.contract_id),
                data: (0u8, value).encode(),
            });
        }
        Ok(TxInclusion { status: TxStatus::InBlock(hash), events })
    }
}
