//! Contract execution results as reported by the contracts runtime.
//!
//! Two weight layouts exist: the legacy single `u64` and the two-dimensional
//! [`WeightV2`]. The layout used by an exec result depends on the runtime
//! version, so decoding takes an explicit [`WeightVersion`].

use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

use crate::{AccountId, Balance};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode, TypeInfo, MaxEncodedLen)]
pub struct WeightV2 {
    #[codec(compact)]
    pub ref_time: u64,
    #[codec(compact)]
    pub proof_size: u64,
}

/// Weight in either representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Weight {
    V1(u64),
    V2(WeightV2),
}

impl Weight {
    /// The single-dimension view: the value itself for V1, ref-time for V2.
    pub fn v1_weight(&self) -> u64 {
        match self {
            Self::V1(w) => *w,
            Self::V2(w) => w.ref_time,
        }
    }

    /// The multi-dimension view. A legacy weight carries no proof size.
    pub fn v2_weight(&self) -> WeightV2 {
        match self {
            Self::V1(w) => WeightV2 { ref_time: *w, proof_size: 0 },
            Self::V2(w) => *w,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.v1_weight() == 0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self::V2(WeightV2::default())
    }
}

impl From<u64> for Weight {
    fn from(w: u64) -> Self {
        Self::V1(w)
    }
}

impl From<WeightV2> for Weight {
    fn from(w: WeightV2) -> Self {
        Self::V2(w)
    }
}

/// Which weight layout an encoded exec result uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum WeightVersion {
    V1,
    #[default]
    V2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode, TypeInfo, MaxEncodedLen)]
pub enum StorageDeposit {
    Refund(Balance),
    Charge(Balance),
}

impl StorageDeposit {
    /// Amount that has to be reserved; refunds need none.
    pub fn charge_or_zero(&self) -> Balance {
        match self {
            Self::Charge(v) => *v,
            Self::Refund(_) => 0,
        }
    }
}

impl Default for StorageDeposit {
    fn default() -> Self {
        Self::Charge(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode, TypeInfo, MaxEncodedLen)]
pub struct ModuleError {
    pub index: u8,
    pub error: [u8; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode, TypeInfo, MaxEncodedLen)]
pub enum TokenError {
    FundsUnavailable,
    OnlyProvider,
    BelowMinimum,
    CannotCreate,
    UnknownAsset,
    Frozen,
    Unsupported,
    CannotCreateHold,
    NotExpendable,
    Blocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode, TypeInfo, MaxEncodedLen)]
pub enum ArithmeticError {
    Underflow,
    Overflow,
    DivisionByZero,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode, TypeInfo, MaxEncodedLen)]
pub enum TransactionalError {
    LimitReached,
    NoLayer,
}

/// Mirror of the runtime's dispatch error encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode, TypeInfo, MaxEncodedLen)]
pub enum DispatchError {
    Other,
    CannotLookup,
    BadOrigin,
    Module(ModuleError),
    ConsumerRemaining,
    NoProviders,
    TooManyConsumers,
    Token(TokenError),
    Arithmetic(ArithmeticError),
    Transactional(TransactionalError),
    Exhausted,
    Corruption,
    Unavailable,
    RootNotAllowed,
}

/// Contract signalled a revert.
pub const FLAG_REVERT: u32 = 0x0000_0001;

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct ExecReturnValue {
    pub flags: u32,
    pub data: Vec<u8>,
}

impl ExecReturnValue {
    pub fn did_revert(&self) -> bool {
        self.flags & FLAG_REVERT != 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct InstantiateReturnValue {
    pub result: ExecReturnValue,
    pub account_id: AccountId,
}

/// Decoded execution report, weights normalised to [`Weight`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractResult<R> {
    pub gas_consumed: Weight,
    pub gas_required: Weight,
    pub storage_deposit: StorageDeposit,
    pub debug_message: Vec<u8>,
    pub result: R,
}

pub type ContractExecResult = ContractResult<Result<ExecReturnValue, DispatchError>>;
pub type ContractInstantiateResult =
    ContractResult<Result<InstantiateReturnValue, DispatchError>>;

#[derive(Decode)]
struct RawContractResult<W, R> {
    gas_consumed: W,
    gas_required: W,
    storage_deposit: StorageDeposit,
    debug_message: Vec<u8>,
    result: R,
}

#[derive(Encode)]
struct RawContractResultRef<'a, W, R> {
    gas_consumed: W,
    gas_required: W,
    storage_deposit: StorageDeposit,
    debug_message: &'a [u8],
    result: &'a R,
}

impl<W: Into<Weight>, R> From<RawContractResult<W, R>> for ContractResult<R> {
    fn from(raw: RawContractResult<W, R>) -> Self {
        Self {
            gas_consumed: raw.gas_consumed.into(),
            gas_required: raw.gas_required.into(),
            storage_deposit: raw.storage_deposit,
            debug_message: raw.debug_message,
            result: raw.result,
        }
    }
}

impl<R: Encode + Decode> ContractResult<R> {
    pub fn decode_with(
        version: WeightVersion,
        input: &mut &[u8],
    ) -> Result<Self, parity_scale_codec::Error> {
        Ok(match version {
            WeightVersion::V1 => RawContractResult::<u64, R>::decode(input)?.into(),
            WeightVersion::V2 => RawContractResult::<WeightV2, R>::decode(input)?.into(),
        })
    }

    /// Encodes with the requested weight layout. Values that do not fit the
    /// legacy layout keep only their ref-time.
    pub fn encode_with(&self, version: WeightVersion) -> Vec<u8> {
        match version {
            WeightVersion::V1 => RawContractResultRef {
                gas_consumed: self.gas_consumed.v1_weight(),
                gas_required: self.gas_required.v1_weight(),
                storage_deposit: self.storage_deposit,
                debug_message: &self.debug_message,
                result: &self.result,
            }
            .encode(),
            WeightVersion::V2 => RawContractResultRef {
                gas_consumed: self.gas_consumed.v2_weight(),
                gas_required: self.gas_required.v2_weight(),
                storage_deposit: self.storage_deposit,
                debug_message: &self.debug_message,
                result: &self.result,
            }
            .encode(),
        }
    }
}
