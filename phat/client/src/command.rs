use std::sync::Arc;

use phat_contract_primitives::{Balance, Nonce, PushContractMessage, Weight};

use crate::{
    abi::ContractAbi,
    registry::PhatRegistry,
    rpc::TxSubmitter,
    submittable::{ContractSubmittableResult, TxInclusion},
    Error, Result,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// Either weight layout; converted to the two-dimensional form.
    pub gas_limit: Option<Weight>,
    pub storage_deposit_limit: Option<Balance>,
    pub transfer: Option<Balance>,
    /// Send the command unencrypted.
    pub plain: bool,
}

/// `transfer + gas_limit * gas_price + storage_deposit_limit`, escrowed with
/// the command so the cluster can charge the worst case up front.
pub fn compute_deposit(
    transfer: Balance,
    gas_limit: u64,
    gas_price: Balance,
    storage_deposit_limit: Balance,
) -> Result<Balance> {
    Balance::from(gas_limit)
        .checked_mul(gas_price)
        .and_then(|gas| gas.checked_add(transfer))
        .and_then(|sum| sum.checked_add(storage_deposit_limit))
        .ok_or(Error::DepositOverflow)
}

/// An encoded, not yet signed, `push_contract_message` call.
pub struct ContractCommand {
    call: PushContractMessage,
    nonce: Nonce,
    abi: Arc<ContractAbi>,
    registry: Arc<PhatRegistry>,
}

impl ContractCommand {
    pub(crate) fn new(
        call: PushContractMessage,
        nonce: Nonce,
        abi: Arc<ContractAbi>,
        registry: Arc<PhatRegistry>,
    ) -> Self {
        Self { call, nonce, abi, registry }
    }

    pub fn call(&self) -> &PushContractMessage {
        &self.call
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn deposit(&self) -> Balance {
        self.call.deposit
    }

    pub async fn sign_and_send(self, submitter: &dyn TxSubmitter) -> Result<ContractSubmittableResult> {
        let inclusion = submitter.submit(&self.call).await?;
        Ok(self.into_result(inclusion))
    }

    /// Wraps an inclusion obtained elsewhere, decoding contract events.
    pub fn into_result(self, inclusion: TxInclusion) -> ContractSubmittableResult {
        ContractSubmittableResult::new(inclusion, &self.abi, self.registry)
    }
}
