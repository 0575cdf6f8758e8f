use phat_contract_primitives::InkQueryError;
use phat_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // configuration
    #[error("a certificate is required to sign the query")]
    MissingCertificate,
    #[error("registry not ready: {0}")]
    RegistryNotReady(&'static str),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),

    // identity
    #[error("origin {origin} does not match certificate address {certificate}")]
    OriginMismatch { origin: String, certificate: String },

    // contract metadata
    #[error("invalid contract metadata: {0}")]
    Abi(String),
    #[error("message `{0}` not found in contract metadata")]
    MessageNotFound(String),
    #[error("message `{0}` does not mutate state, query it instead")]
    NotMutating(String),

    // remote
    #[error("query failed: {0}")]
    Query(InkQueryError),

    // unexpected shape
    #[error("unexpected response: expected InkMessageReturn, got {0}")]
    UnexpectedResponse(&'static str),
    #[error("response nonce does not match the request")]
    NonceMismatch,
    #[error("scale codec: {0}")]
    Codec(#[from] parity_scale_codec::Error),
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    // command building
    #[error("deposit overflows the balance type")]
    DepositOverflow,

    // finalisation
    #[error("transaction has not been included in a block")]
    NotIncluded,
    #[error("worker did not pass block {block} within {timeout_ms} ms")]
    FinalizeTimeout { block: u32, timeout_ms: u64 },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
