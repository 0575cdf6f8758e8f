use std::sync::Arc;

use parity_scale_codec::{Decode, Encode};
use phat_contract_primitives::{
    AccountId, Balance, ContractId, ContractInstantiateResult, EncryptedData, Hash, InkQuery,
    InkQueryData, InkQueryHead, InkQueryOk, InkResponse, Nonce, WeightVersion,
};
use phat_crypto::{Keypair, PublicKey};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    abi::ConstructorSpec,
    cert::Certificate,
    clock::{Clock, TokioClock},
    config::ClientConfig,
    query::{effective_gas_required, QueryOptions},
    rpc::{ChainRpc, ContractQueryRequest, WorkerRpc},
    Error, Result,
};

/// Cluster parameters published on chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterInfo {
    #[serde(with = "hex_hash")]
    pub id: Hash,
    /// Price of one unit of ref-time.
    pub gas_price: Balance,
}

/// Connection to a cluster through one worker.
pub struct PhatRegistry {
    chain: Arc<dyn ChainRpc>,
    worker: Arc<dyn WorkerRpc>,
    cluster: ClusterInfo,
    remote_pubkey: PublicKey,
    config: ClientConfig,
    clock: Arc<dyn Clock>,
}

impl PhatRegistry {
    pub async fn connect(
        chain: Arc<dyn ChainRpc>,
        worker: Arc<dyn WorkerRpc>,
        cluster: ClusterInfo,
        config: ClientConfig,
    ) -> Result<Arc<Self>> {
        Self::connect_with_clock(chain, worker, cluster, config, Arc::new(TokioClock::default()))
            .await
    }

    pub async fn connect_with_clock(
        chain: Arc<dyn ChainRpc>,
        worker: Arc<dyn WorkerRpc>,
        cluster: ClusterInfo,
        config: ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let info = worker.get_info().await?;
        if !info.initialized {
            return Err(Error::RegistryNotReady("worker is not initialized"));
        }
        let key = info
            .ecdh_public_key()?
            .ok_or(Error::RegistryNotReady("worker publishes no ecdh key"))?;
        let remote_pubkey = PublicKey::from_bytes(&key)?;
        info!(blocknum = info.blocknum, gas_price = %cluster.gas_price, "connected to worker");
        Ok(Arc::new(Self { chain, worker, cluster, remote_pubkey, config, clock }))
    }

    pub fn chain(&self) -> &Arc<dyn ChainRpc> {
        &self.chain
    }

    pub fn worker(&self) -> &Arc<dyn WorkerRpc> {
        &self.worker
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cluster(&self) -> &ClusterInfo {
        &self.cluster
    }

    pub fn gas_price(&self) -> Balance {
        self.cluster.gas_price
    }

    pub fn weight_version(&self) -> WeightVersion {
        self.config.weight_version
    }

    pub fn remote_pubkey(&self) -> &PublicKey {
        &self.remote_pubkey
    }

    /// Dry-runs a constructor of an uploaded code blob.
    pub async fn estimate_instantiate(
        &self,
        origin: &AccountId,
        code_hash: Hash,
        constructor: &ConstructorSpec,
        options: &QueryOptions<'_>,
        args: &[u8],
    ) -> Result<ContractInstantiateResult> {
        let cert = options.authorize(origin)?;
        let data = InkQueryData::InkInstantiate {
            code_hash,
            salt: options.salt.clone().unwrap_or_default(),
            instantiate_data: constructor.encode_call(args),
            deposit: options.deposit.unwrap_or(0),
            transfer: options.transfer.unwrap_or(0),
        };
        let ok = self.send_query(cert, AccountId::new(self.cluster.id), data).await?;
        let bytes = match ok {
            InkQueryOk::InkInstantiateReturn(bytes) => bytes,
            other => return Err(Error::UnexpectedResponse(other.variant_name())),
        };
        let mut result =
            ContractInstantiateResult::decode_with(self.weight_version(), &mut &bytes[..])?;
        result.gas_required = effective_gas_required(result.gas_consumed, result.gas_required);
        Ok(result)
    }

    /// Encrypts `data` for the worker, sends it signed by `cert` and returns
    /// the decrypted success payload.
    pub(crate) async fn send_query(
        &self,
        cert: &Certificate,
        id: ContractId,
        data: InkQueryData,
    ) -> Result<InkQueryOk> {
        let ephemeral = Keypair::generate(&mut OsRng);
        let key = ephemeral.agree(&self.remote_pubkey);
        let mut nonce: Nonce = [0u8; 32];
        OsRng.fill_bytes(&mut nonce);

        let query = InkQuery { head: InkQueryHead { nonce, id }, data };
        let envelope = phat_crypto::seal(&ephemeral, &key, &query.encode(), &mut OsRng)?;
        let encoded_encrypted_data = envelope.encode();
        let signature = cert.sign_query(&encoded_encrypted_data);
        debug!(contract = %id, bytes = encoded_encrypted_data.len(), "dispatching encrypted query");

        let response = self
            .worker
            .contract_query(ContractQueryRequest {
                encoded_encrypted_data,
                signature: Some(signature),
            })
            .await?;

        let reply = EncryptedData::decode(&mut &response.encoded_encrypted_data[..])?;
        let plaintext = phat_crypto::open(&key, &reply)?;
        let response = InkResponse::decode(&mut &plaintext[..])?;
        if response.nonce != nonce {
            return Err(Error::NonceMismatch);
        }
        response.result.map_err(|kind| {
            debug!(contract = %id, %kind, "query rejected by worker");
            Error::Query(kind)
        })
    }
}

mod hex_hash {
    use phat_contract_primitives::Hash;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(hash)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut hash = Hash::default();
        hex::decode_to_slice(text.trim_start_matches("0x"), &mut hash)
            .map_err(serde::de::Error::custom)?;
        Ok(hash)
    }
}
