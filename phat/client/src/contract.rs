use std::sync::Arc;

use parity_scale_codec::{Decode, Encode};
use phat_contract_primitives::{
    AccountId, CommandPayload, ContractExecResult, ContractId, InkCommand, InkQueryData,
    InkQueryOk, Nonce, PushContractMessage,
};
use phat_crypto::{Keypair, PublicKey};
use rand::{rngs::OsRng, RngCore};
use tracing::debug;

use crate::{
    abi::ContractAbi,
    command::{compute_deposit, CommandOptions, ContractCommand},
    query::{ContractQueryResult, QueryOptions},
    registry::PhatRegistry,
    Error, Result,
};

/// Handle to one deployed contract.
#[derive(Clone)]
pub struct PhatContract {
    address: ContractId,
    contract_key: PublicKey,
    abi: Arc<ContractAbi>,
    registry: Arc<PhatRegistry>,
}

impl PhatContract {
    pub fn new(
        registry: Arc<PhatRegistry>,
        abi: Arc<ContractAbi>,
        address: ContractId,
        contract_key: &[u8; 32],
    ) -> Result<Self> {
        let contract_key = PublicKey::from_bytes(contract_key)?;
        Ok(Self { address, contract_key, abi, registry })
    }

    pub fn address(&self) -> &ContractId {
        &self.address
    }

    pub fn abi(&self) -> &Arc<ContractAbi> {
        &self.abi
    }

    pub fn registry(&self) -> &Arc<PhatRegistry> {
        &self.registry
    }

    /// Runs `message` read-only on the worker. `args` are the SCALE encoded
    /// message arguments; the return value, if any, decodes as `R`.
    pub async fn query<R: Decode>(
        &self,
        message: &str,
        origin: &AccountId,
        options: &QueryOptions<'_>,
        args: &[u8],
    ) -> Result<ContractQueryResult<R>> {
        let cert = options.authorize(origin)?;
        let spec = self.abi.find_message(message)?;
        let data = InkQueryData::InkMessage {
            payload: spec.encode_call(args),
            deposit: options.deposit.unwrap_or(0),
            transfer: options.transfer.unwrap_or(0),
            estimating: options.estimating,
        };

        let ok = self.registry.send_query(cert, self.address, data).await?;
        let bytes = match ok {
            InkQueryOk::InkMessageReturn(bytes) => bytes,
            other => return Err(Error::UnexpectedResponse(other.variant_name())),
        };
        let exec = ContractExecResult::decode_with(self.registry.weight_version(), &mut &bytes[..])?;
        ContractQueryResult::from_exec(exec, spec.returns_value())
    }

    /// Dry-runs a message in estimating mode; the reported gas and storage
    /// deposit feed [`CommandOptions`].
    pub async fn estimate<R: Decode>(
        &self,
        message: &str,
        origin: &AccountId,
        options: &QueryOptions<'_>,
        args: &[u8],
    ) -> Result<ContractQueryResult<R>> {
        let options = QueryOptions { estimating: true, ..options.clone() };
        self.query(message, origin, &options, args).await
    }

    /// Builds the on-chain call carrying a mutating message. Nothing is sent.
    pub fn command(
        &self,
        message: &str,
        options: &CommandOptions,
        args: &[u8],
    ) -> Result<ContractCommand> {
        let spec = self.abi.find_message(message)?;
        if !spec.mutates {
            return Err(Error::NotMutating(spec.label.clone()));
        }

        let gas_limit = options.gas_limit.unwrap_or_default().v2_weight();
        let transfer = options.transfer.unwrap_or(0);
        let deposit = compute_deposit(
            transfer,
            gas_limit.ref_time,
            self.registry.gas_price(),
            options.storage_deposit_limit.unwrap_or(0),
        )?;

        let mut nonce: Nonce = [0u8; 32];
        OsRng.fill_bytes(&mut nonce);
        let command = InkCommand::InkMessage {
            nonce,
            message: spec.encode_call(args),
            transfer,
            gas_limit: gas_limit.ref_time,
            storage_deposit_limit: options.storage_deposit_limit,
        };

        let payload = if options.plain {
            CommandPayload::Plain(command.encode())
        } else {
            let ephemeral = Keypair::generate(&mut OsRng);
            let key = ephemeral.agree(&self.contract_key);
            CommandPayload::Encrypted(phat_crypto::seal(
                &ephemeral,
                &key,
                &command.encode(),
                &mut OsRng,
            )?)
        };
        debug!(contract = %self.address, message = %spec.label, deposit = %deposit, "built command");

        let call = PushContractMessage { contract_id: self.address, payload: payload.encode(), deposit };
        Ok(ContractCommand::new(call, nonce, self.abi.clone(), self.registry.clone()))
    }
}
