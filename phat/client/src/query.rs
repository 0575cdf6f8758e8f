use parity_scale_codec::Decode;
use phat_contract_primitives::{
    AccountId, Balance, ContractExecResult, DispatchError, ExecReturnValue, StorageDeposit, Weight,
};

use crate::{cert::Certificate, Error, Result};

/// Per-call options for queries and instantiate estimation.
#[derive(Clone, Debug, Default)]
pub struct QueryOptions<'a> {
    pub cert: Option<&'a Certificate>,
    /// Only used when estimating an instantiation.
    pub salt: Option<Vec<u8>>,
    pub estimating: bool,
    pub deposit: Option<Balance>,
    pub transfer: Option<Balance>,
}

impl<'a> QueryOptions<'a> {
    pub fn with_cert(cert: &'a Certificate) -> Self {
        Self { cert: Some(cert), ..Default::default() }
    }

    /// Returns the certificate once `origin` is known to be the identity it
    /// certifies. Runs before any key material is generated.
    pub(crate) fn authorize(&self, origin: &AccountId) -> Result<&'a Certificate> {
        let cert = self.cert.ok_or(Error::MissingCertificate)?;
        let origin = origin.to_ss58check_with_version(cert.ss58_prefix());
        let certificate = cert.address();
        if origin != certificate {
            return Err(Error::OriginMismatch { origin, certificate });
        }
        Ok(cert)
    }
}

/// Outcome of a successful query round-trip. The contract call itself may
/// still have failed; see `result`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractQueryResult<R> {
    pub gas_consumed: Weight,
    pub gas_required: Weight,
    pub storage_deposit: StorageDeposit,
    pub debug_message: String,
    pub result: Result<ExecReturnValue, DispatchError>,
    /// Decoded return value; `None` unless the call succeeded and the message
    /// declares a return type.
    pub output: Option<R>,
}

impl<R: Decode> ContractQueryResult<R> {
    pub(crate) fn from_exec(exec: ContractExecResult, returns_value: bool) -> Result<Self> {
        let output = match &exec.result {
            Ok(ret) if returns_value => Some(R::decode(&mut &ret.data[..])?),
            _ => None,
        };
        Ok(Self {
            gas_consumed: exec.gas_consumed,
            gas_required: effective_gas_required(exec.gas_consumed, exec.gas_required),
            storage_deposit: exec.storage_deposit,
            debug_message: String::from_utf8_lossy(&exec.debug_message).into_owned(),
            result: exec.result,
            output,
        })
    }
}

/// Workers on legacy runtimes report a zero required weight; the consumed
/// weight is the best estimate then.
pub fn effective_gas_required(consumed: Weight, required: Weight) -> Weight {
    if required.is_zero() {
        consumed
    } else {
        required
    }
}
